//! RF Delay — frequency-domain fractional delay
//!
//! Shifts real ADC lanes in time by an arbitrary (sub-sample) amount to
//! undo unequal RF path lengths between the optical hybrid and the ADC.
//! Each row is transformed, multiplied by a linear phase ramp and
//! transformed back:
//!
//! ```text
//! x[n] ──FFT──► X[k] ──× e^{-j2π·τ·f_k}──► Y[k] ──IFFT──► Re{y[n]}
//! ```
//!
//! A positive `τ` moves the signal later in time. The shift is ideal but
//! circular: samples pushed off one end wrap around to the other. Callers
//! that need a linear delay pad the block before calling.
//!
//! For even row lengths the Nyquist bin of a real signal is itself real, so
//! keeping the real part reduces its phase factor to `cos(π·τ·fs)`. Whole
//! sample delays and signals without Nyquist content are shifted exactly.
//!
//! ## Example
//!
//! ```rust
//! use cohrx_core::block::SampleBlock;
//! use cohrx_core::rf_delay::compensate_rf_delay;
//!
//! let fs = 50e9;
//! let lanes = SampleBlock::from_rows(vec![vec![0.0, 1.0, 0.0, 0.0]; 2]).unwrap();
//!
//! // Delay both lanes by one sample (20 ps at 50 GS/s)
//! let shifted = compensate_rf_delay(&lanes, 1.0 / fs, fs).unwrap();
//! assert_eq!(shifted.shape(), (2, 4));
//! assert!((shifted.row(0)[2] - 1.0).abs() < 1e-12);
//! ```

use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

use crate::block::SampleBlock;
use crate::fft_utils::{fft_frequencies, FftProcessor};
use crate::types::{DspError, DspResult};

/// ADC sample rate assumed when no hardware profile supplies one (50 GS/s)
pub const DEFAULT_SAMPLE_RATE: f64 = 50e9;

/// Fractional delay engine for rows of one fixed length.
///
/// Holds the FFT plan and the frequency axis so repeated calls with the same
/// row length and sample rate skip re-planning.
#[derive(Debug)]
pub struct RfDelayCompensator {
    fft: FftProcessor,
    sample_rate: f64,
    frequencies: Vec<f64>,
    buffer: Vec<Complex64>,
}

impl RfDelayCompensator {
    /// Plan for rows of `row_len` samples taken at `sample_rate` Hz.
    pub fn new(row_len: usize, sample_rate: f64) -> DspResult<Self> {
        if row_len == 0 {
            return Err(DspError::Shape("row length must be > 0".into()));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::InvalidParameter(format!(
                "sample rate must be finite and positive, got {}",
                sample_rate
            )));
        }

        Ok(Self {
            fft: FftProcessor::new(row_len),
            sample_rate,
            frequencies: fft_frequencies(row_len, sample_rate),
            buffer: vec![Complex64::new(0.0, 0.0); row_len],
        })
    }

    pub fn row_len(&self) -> usize {
        self.fft.size()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Per-bin multiplier `exp(-j·2π·delay·f)`
    pub fn phase_ramp(&self, delay: f64) -> DspResult<Vec<Complex64>> {
        check_delay(delay)?;
        Ok(self
            .frequencies
            .iter()
            .map(|&f| Complex64::from_polar(1.0, -2.0 * PI * delay * f))
            .collect())
    }

    /// Delay a single row.
    pub fn process(&mut self, row: &[f64], delay: f64) -> DspResult<Vec<f64>> {
        self.check_row(row.len())?;
        let ramp = self.phase_ramp(delay)?;
        let mut out = row.to_vec();
        self.shift_row(&mut out, &ramp);
        Ok(out)
    }

    /// Delay every row of `block` by the same amount.
    ///
    /// The output has the block's shape, including whether it was 1-D.
    pub fn process_block(&mut self, block: &SampleBlock<f64>, delay: f64) -> DspResult<SampleBlock<f64>> {
        self.check_row(block.row_len())?;
        let ramp = self.phase_ramp(delay)?;

        let mut out = block.clone();
        for row in out.iter_rows_mut() {
            self.shift_row(row, &ramp);
        }
        Ok(out)
    }

    /// Delay row `r` of `block` by `delays[r]`.
    pub fn process_block_per_row(
        &mut self,
        block: &SampleBlock<f64>,
        delays: &[f64],
    ) -> DspResult<SampleBlock<f64>> {
        self.check_row(block.row_len())?;
        if delays.len() != block.rows() {
            return Err(DspError::Shape(format!(
                "{} delays supplied for {} rows",
                delays.len(),
                block.rows()
            )));
        }

        let ramps = delays
            .iter()
            .map(|&d| self.phase_ramp(d))
            .collect::<DspResult<Vec<_>>>()?;

        let mut out = block.clone();
        for (row, ramp) in out.iter_rows_mut().zip(&ramps) {
            self.shift_row(row, ramp);
        }
        Ok(out)
    }

    fn check_row(&self, len: usize) -> DspResult<()> {
        if len != self.row_len() {
            return Err(DspError::Shape(format!(
                "row length {} does not match planned length {}",
                len,
                self.row_len()
            )));
        }
        Ok(())
    }

    /// FFT, ramp, IFFT, keep the real part; overwrites `row`.
    fn shift_row(&mut self, row: &mut [f64], ramp: &[Complex64]) {
        for (b, &x) in self.buffer.iter_mut().zip(row.iter()) {
            *b = Complex64::new(x, 0.0);
        }
        self.fft.fft_inplace(&mut self.buffer);
        for (b, &h) in self.buffer.iter_mut().zip(ramp) {
            *b *= h;
        }
        self.fft.ifft_inplace(&mut self.buffer);
        for (x, b) in row.iter_mut().zip(self.buffer.iter()) {
            *x = b.re;
        }
    }
}

fn check_delay(delay: f64) -> DspResult<()> {
    if !delay.is_finite() {
        return Err(DspError::InvalidParameter(format!(
            "delay must be finite, got {}",
            delay
        )));
    }
    Ok(())
}

/// Delay every row of `block` by `delay` seconds.
pub fn compensate_rf_delay(
    block: &SampleBlock<f64>,
    delay: f64,
    sample_rate: f64,
) -> DspResult<SampleBlock<f64>> {
    RfDelayCompensator::new(block.row_len(), sample_rate)?.process_block(block, delay)
}

/// Delay a single sequence by `delay` seconds.
pub fn compensate_rf_delay_slice(signal: &[f64], delay: f64, sample_rate: f64) -> DspResult<Vec<f64>> {
    if signal.is_empty() {
        return Err(DspError::Shape("sample block is empty".into()));
    }
    RfDelayCompensator::new(signal.len(), sample_rate)?.process(signal, delay)
}
