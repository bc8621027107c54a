//! Core types for front-end compensation
//!
//! This module defines the sample types shared by the compensators and the
//! error taxonomy every fallible operation reports through.
//!
//! ## I/Q from an Optical Hybrid
//!
//! A coherent receiver mixes the received field with a local oscillator in a
//! 90° optical hybrid. Balanced photodiodes then deliver two real signals per
//! polarization:
//! - **I (In-phase)**: the field projected onto the LO phase
//! - **Q (Quadrature)**: the field projected onto the LO phase + 90°
//!
//! A real hybrid never splits at exactly 90° and never has identical
//! responsivity on both arms, so I and Q arrive slightly correlated and with
//! unequal power:
//!
//! ```text
//!            Q                          Q'
//!            ^                          ^     /
//!            |                          |    /  skewed axis (90° - φ)
//!            |                          |   /
//!            |                          |  /
//!   ---------+---------> I     ---------+/--------> I
//!        ideal hybrid              imbalanced hybrid
//! ```

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// A real-valued ADC sample
pub type Sample = f64;

/// Result type for compensation operations
pub type DspResult<T> = Result<T, DspError>;

/// Errors raised by the compensators.
///
/// Every variant is deterministic: re-running the same block reproduces it,
/// so callers drop or flag the block instead of retrying.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DspError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Non-finite sample at index {index}")]
    NonFiniteInput { index: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl DspError {
    /// True for errors caused by the content of the block rather than by its
    /// shape or by the caller's parameters.
    pub fn is_data_dependent(&self) -> bool {
        matches!(
            self,
            DspError::DegenerateInput(_) | DspError::Domain(_) | DspError::NonFiniteInput { .. }
        )
    }
}

/// Helper functions for working with complex sample blocks
pub mod complex_ops {
    use super::*;

    /// Arithmetic mean of a block. Returns zero for an empty block.
    ///
    /// Summed at unit peak with one correction pass, so the result stays
    /// finite for any finite block and is accurate to a few ulps even when a
    /// large DC level dominates.
    pub fn mean(samples: &[IQSample]) -> IQSample {
        let peak = peak_component(samples);
        if peak == 0.0 || !peak.is_finite() {
            let sum: Complex = samples.iter().sum();
            return sum / samples.len().max(1) as f64;
        }
        let n = samples.len() as f64;
        let rough = samples.iter().map(|&s| s / peak).sum::<Complex>() / n;
        let correction = samples.iter().map(|&s| s / peak - rough).sum::<Complex>() / n;
        (rough + correction) * peak
    }

    /// Largest `|re|` or `|im|` in a block; zero for an empty block
    #[inline]
    pub fn peak_component(samples: &[IQSample]) -> f64 {
        samples
            .iter()
            .fold(0.0, |peak: f64, s| peak.max(s.re.abs()).max(s.im.abs()))
    }

    /// Index of the first NaN or infinite sample, if any
    pub fn first_non_finite(samples: &[IQSample]) -> Option<usize> {
        samples.iter().position(|s| !s.re.is_finite() || !s.im.is_finite())
    }

    /// Build complex samples from separate I and Q rails
    pub fn from_rails(i: &[f64], q: &[f64]) -> Vec<IQSample> {
        i.iter().zip(q).map(|(&re, &im)| Complex::new(re, im)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        let samples = vec![
            Complex::new(1.0, 2.0),
            Complex::new(3.0, -2.0),
            Complex::new(2.0, 3.0),
        ];
        let m = complex_ops::mean(&samples);
        assert_relative_eq!(m.re, 2.0, epsilon = 1e-12);
        assert_relative_eq!(m.im, 1.0, epsilon = 1e-12);
        assert_eq!(complex_ops::mean(&[]), Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_mean_does_not_overflow() {
        // A plain running sum of these reaches infinity
        let samples = vec![Complex::new(1e308, -1e308); 4];
        let m = complex_ops::mean(&samples);
        assert_relative_eq!(m.re, 1e308, max_relative = 1e-15);
        assert_relative_eq!(m.im, -1e308, max_relative = 1e-15);
    }

    #[test]
    fn test_peak_component() {
        let samples = vec![Complex::new(0.5, -3.0), Complex::new(-2.0, 1.0)];
        assert_eq!(complex_ops::peak_component(&samples), 3.0);
        assert_eq!(complex_ops::peak_component(&[]), 0.0);
    }

    #[test]
    fn test_first_non_finite() {
        let mut samples = vec![Complex::new(0.5, 0.5); 8];
        assert_eq!(complex_ops::first_non_finite(&samples), None);
        samples[5].im = f64::NAN;
        assert_eq!(complex_ops::first_non_finite(&samples), Some(5));
    }

    #[test]
    fn test_error_display() {
        let err = DspError::NonFiniteInput { index: 3 };
        assert_eq!(err.to_string(), "Non-finite sample at index 3");
        assert!(err.is_data_dependent());
        assert!(!DspError::Shape("empty".into()).is_data_dependent());
    }
}
