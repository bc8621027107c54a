//! FFT Utilities
//!
//! Thin wrapper around `rustfft` giving the compensators a planned
//! forward/inverse pair of one fixed length, plus the standard FFT
//! frequency axis.
//!
//! ## Bin Ordering
//!
//! Both the transform output and [`fft_frequencies`] use the usual
//! unshifted order: DC first, then positive frequencies, then negative
//! frequencies counting up towards zero.
//!
//! ```text
//! n = 8, fs = 8 Hz
//!
//! bin:    0    1    2    3    4    5    6    7
//! f[Hz]:  0    1    2    3   -4   -3   -2   -1
//!                             ^
//!                          Nyquist
//! ```

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Planned FFT pair for one transform length
pub struct FftProcessor {
    /// FFT size
    size: usize,
    /// Forward FFT instance
    fft_forward: Arc<dyn Fft<f64>>,
    /// Inverse FFT instance
    fft_inverse: Arc<dyn Fft<f64>>,
    /// Scratch buffer shared by both directions
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .finish()
    }
}

impl FftProcessor {
    /// Plan forward and inverse transforms of length `size`
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(size);
        let fft_inverse = planner.plan_fft_inverse(size);
        let scratch_len = fft_forward
            .get_inplace_scratch_len()
            .max(fft_inverse.get_inplace_scratch_len());
        let scratch = vec![Complex64::new(0.0, 0.0); scratch_len];

        Self {
            size,
            fft_forward,
            fft_inverse,
            scratch,
        }
    }

    /// Get the FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward FFT in place (unnormalised)
    pub fn fft_inplace(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(buffer.len(), self.size);
        self.fft_forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Inverse FFT in place, normalised by 1/N so that
    /// `ifft(fft(x)) == x`
    pub fn ifft_inplace(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(buffer.len(), self.size);
        self.fft_inverse.process_with_scratch(buffer, &mut self.scratch);

        let scale = 1.0 / self.size as f64;
        for sample in buffer.iter_mut() {
            *sample *= scale;
        }
    }
}

/// Frequency of every FFT bin in Hz, in unshifted bin order.
///
/// Bin spacing is `sample_rate / n`. For even `n` the Nyquist bin is
/// reported as `-sample_rate / 2`.
pub fn fft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let resolution = sample_rate / n as f64;
    // Bins [0, positive_end) are non-negative
    let positive_end = (n + 1) / 2;
    (0..n)
        .map(|k| {
            let idx = if k < positive_end {
                k as f64
            } else {
                k as f64 - n as f64
            };
            idx * resolution
        })
        .collect()
}
