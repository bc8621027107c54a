//! Front-end impairment synthesizer
//!
//! Models what an imperfect coherent front end does to a clean signal so the
//! compensators can be exercised against known ground truth.
//!
//! ## Blocks
//!
//! - **HybridImpairment**: phase skew, Q gain error and DC bias of a 90°
//!   optical hybrid
//! - **skew_lanes**: unequal RF path delays between the hybrid outputs and
//!   the ADC lanes
//!
//! ## Example
//!
//! ```rust
//! use cohrx_core::impairments::HybridImpairment;
//! use cohrx_core::iq_imbalance::estimate_iq_imbalance;
//! use num_complex::Complex64;
//! use std::f64::consts::PI;
//!
//! let clean: Vec<Complex64> = (0..1000)
//!     .map(|n| Complex64::from_polar(1.0, 2.0 * PI * 25.0 * n as f64 / 1000.0))
//!     .collect();
//!
//! let hybrid = HybridImpairment::from_degrees_db(6.0, 0.5);
//! let measured = hybrid.apply(&clean);
//!
//! let params = estimate_iq_imbalance(&measured).unwrap();
//! let expected = hybrid.expected_params();
//! assert!((params.phase_inbalance - expected.phase_inbalance).abs() < 1e-9);
//! ```

use num_complex::Complex64;

use crate::block::SampleBlock;
use crate::iq_imbalance::ImbalanceParams;
use crate::rf_delay::RfDelayCompensator;
use crate::types::{DspResult, IQSample};

/// Imperfect 90° hybrid.
///
/// Model: `I' = I + dc.re`, `Q' = gain · (Q·cos φ + I·sin φ) + dc.im`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridImpairment {
    /// Deviation from 90° between the I and Q arms, radians
    pub phase_rad: f64,
    /// Linear amplitude of the Q arm relative to I
    pub gain: f64,
    /// Constant bias added after detection
    pub dc_offset: Complex64,
}

impl HybridImpairment {
    pub fn new(phase_rad: f64, gain: f64) -> Self {
        Self {
            phase_rad,
            gain,
            dc_offset: Complex64::new(0.0, 0.0),
        }
    }

    /// Phase skew in degrees and Q gain error in dB (amplitude)
    pub fn from_degrees_db(phase_deg: f64, gain_db: f64) -> Self {
        Self::new(phase_deg.to_radians(), 10.0_f64.powf(gain_db / 20.0))
    }

    pub fn with_dc_offset(mut self, dc_offset: Complex64) -> Self {
        self.dc_offset = dc_offset;
        self
    }

    /// Impair a block of clean samples.
    pub fn apply(&self, samples: &[IQSample]) -> Vec<IQSample> {
        let (sin_p, cos_p) = self.phase_rad.sin_cos();
        samples
            .iter()
            .map(|s| {
                let q = self.gain * (s.im * cos_p + s.re * sin_p);
                Complex64::new(s.re, q) + self.dc_offset
            })
            .collect()
    }

    /// Parameters the blind estimator recovers when the clean input has
    /// uncorrelated, equal-power I and Q.
    pub fn expected_params(&self) -> ImbalanceParams {
        let (sin_p, cos_p) = self.phase_rad.sin_cos();
        let phase_inbalance = (-self.gain * sin_p).asin();
        let cos_est = phase_inbalance.cos();
        ImbalanceParams {
            phase_inbalance,
            amp_inbalance: (cos_est * cos_est) / (self.gain * self.gain * cos_p * cos_p),
            dc_offset: self.dc_offset,
        }
    }
}

/// Delay row `r` of `lanes` by `delays[r]` seconds, as unequal RF cable
/// lengths would.
pub fn skew_lanes(lanes: &SampleBlock<f64>, delays: &[f64], sample_rate: f64) -> DspResult<SampleBlock<f64>> {
    RfDelayCompensator::new(lanes.row_len(), sample_rate)?.process_block_per_row(lanes, delays)
}
