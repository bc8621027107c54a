//! Sample blocks
//!
//! A [`SampleBlock`] is either a single sequence or a batch of equal-length
//! rows (one row per ADC lane or polarization), stored row-major in one
//! contiguous buffer. The block remembers which of the two it is so a
//! transform can hand back exactly the shape it was given.
//!
//! ```rust
//! use cohrx_core::block::SampleBlock;
//!
//! let single = SampleBlock::single(vec![1.0, 2.0, 3.0]).unwrap();
//! assert_eq!(single.shape(), (1, 3));
//! assert!(!single.is_batch());
//!
//! let batch = SampleBlock::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! assert_eq!(batch.shape(), (2, 2));
//! assert_eq!(batch.row(1), &[3.0, 4.0]);
//! ```

use crate::types::{DspError, DspResult};

/// One or more equal-length rows of uniformly sampled values.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    batched: bool,
}

impl<T> SampleBlock<T> {
    /// Wrap a single (1-D) sequence.
    pub fn single(samples: Vec<T>) -> DspResult<Self> {
        if samples.is_empty() {
            return Err(DspError::Shape("sample block is empty".into()));
        }
        let cols = samples.len();
        Ok(Self {
            data: samples,
            rows: 1,
            cols,
            batched: false,
        })
    }

    /// Build a 2-D batch from individual rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> DspResult<Self> {
        let n_rows = rows.len();
        let cols = match rows.first() {
            Some(first) => first.len(),
            None => return Err(DspError::Shape("batch has no rows".into())),
        };
        if cols == 0 {
            return Err(DspError::Shape("batch rows have zero length".into()));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(DspError::Shape(format!(
                "row {} has length {}, expected {}",
                bad,
                rows[bad].len(),
                cols
            )));
        }

        let mut data = Vec::with_capacity(n_rows * cols);
        for row in rows {
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: n_rows,
            cols,
            batched: true,
        })
    }

    /// Build a 2-D batch from a row-major buffer.
    pub fn from_flat(data: Vec<T>, rows: usize, cols: usize) -> DspResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(DspError::Shape(format!("invalid batch shape {}x{}", rows, cols)));
        }
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            DspError::Shape(format!("batch shape {}x{} overflows usize", rows, cols))
        })?;
        if data.len() != expected {
            return Err(DspError::Shape(format!(
                "buffer of {} samples does not fit shape {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self {
            data,
            rows,
            cols,
            batched: true,
        })
    }

    /// `(rows, cols)`; a single sequence reports one row.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Length of every row
    pub fn row_len(&self) -> usize {
        self.cols
    }

    /// Whether the block was built as a 2-D batch
    pub fn is_batch(&self) -> bool {
        self.batched
    }

    pub fn row(&self, index: usize) -> &[T] {
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut [T] {
        let start = index * self.cols;
        &mut self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.cols)
    }

    pub fn iter_rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, T> {
        self.data.chunks_exact_mut(self.cols)
    }

    /// Row-major view of all samples
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Split into owned rows
    pub fn into_rows(self) -> Vec<Vec<T>> {
        let cols = self.cols;
        let mut data = self.data;
        let mut rows = Vec::with_capacity(self.rows);
        // Peel rows off the tail so each split moves one row only
        while !data.is_empty() {
            let at = data.len() - cols;
            rows.push(data.split_off(at));
        }
        rows.reverse();
        rows
    }

    /// Apply `f` to every sample, keeping the shape (including 1-D vs 2-D).
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> SampleBlock<U> {
        SampleBlock {
            data: self.data.iter().map(f).collect(),
            rows: self.rows,
            cols: self.cols,
            batched: self.batched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_shape() {
        let block = SampleBlock::single(vec![0.0; 16]).unwrap();
        assert_eq!(block.shape(), (1, 16));
        assert!(!block.is_batch());
        assert_eq!(block.iter_rows().count(), 1);
    }

    #[test]
    fn test_batch_shape() {
        let block = SampleBlock::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(block.shape(), (2, 3));
        assert!(block.is_batch());
        assert_eq!(block.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(block.as_slice().len(), 6);
    }

    #[test]
    fn test_one_row_batch_stays_batch() {
        let block = SampleBlock::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(block.shape(), (1, 2));
        assert!(block.is_batch());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(SampleBlock::<f64>::single(vec![]), Err(DspError::Shape(_))));
        assert!(matches!(SampleBlock::<f64>::from_rows(vec![]), Err(DspError::Shape(_))));
        assert!(matches!(
            SampleBlock::<f64>::from_rows(vec![vec![], vec![]]),
            Err(DspError::Shape(_))
        ));
        assert!(matches!(
            SampleBlock::<f64>::from_flat(vec![], 0, 4),
            Err(DspError::Shape(_))
        ));
    }

    #[test]
    fn test_ragged_rejected() {
        let err = SampleBlock::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err, DspError::Shape("row 1 has length 1, expected 2".into()));
    }

    #[test]
    fn test_from_flat_mismatch() {
        assert!(SampleBlock::from_flat(vec![0.0; 7], 2, 4).is_err());
        assert!(matches!(
            SampleBlock::<f64>::from_flat(vec![], usize::MAX, 2),
            Err(DspError::Shape(_))
        ));
        let block = SampleBlock::from_flat(vec![0.0; 8], 2, 4).unwrap();
        assert_eq!(block.shape(), (2, 4));
    }

    #[test]
    fn test_into_rows_and_map() {
        let block = SampleBlock::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        let doubled = block.map(|&x| x * 2);
        assert!(doubled.is_batch());
        assert_eq!(doubled.into_rows(), vec![vec![2, 4], vec![6, 8], vec![10, 12]]);
    }

    #[test]
    fn test_row_mut() {
        let mut block = SampleBlock::from_rows(vec![vec![0.0; 3], vec![0.0; 3]]).unwrap();
        block.row_mut(1)[2] = 7.0;
        assert_eq!(block.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.0, 7.0]);
    }
}
