//! IQ Imbalance — blind estimation and orthogonalization
//!
//! Corrects the phase and amplitude mismatch an optical 90° hybrid leaves
//! between I and Q. The estimate is taken blindly from second-order moments
//! of one block: for a balanced receiver I and Q are uncorrelated and carry
//! equal power, so any residual correlation is phase error and any residual
//! power ratio is amplitude error.
//!
//! ## Model
//!
//! I is taken as the reference axis. Q is rotated back onto the axis
//! orthogonal to I, then rescaled to I's power:
//!
//! ```text
//! mon        = Σ I·Q / Σ I²
//! φ          = asin(-mon)
//! Q_bal      = (Q + sin φ · I) / cos φ
//! amp        = Σ I² / Σ Q_bal²
//! output     = I + j · Q_bal · √amp
//! ```
//!
//! The block mean is removed first, so the output never carries the input's
//! DC offset.
//!
//! ## Failure policy
//!
//! An estimate that leaves the real arcsine domain (`|mon| > 1`) or lands on
//! a ±90° phase error is rejected with [`DspError::Domain`]; nothing is
//! clamped. Zero I power or zero balanced-Q power is rejected with
//! [`DspError::DegenerateInput`].
//!
//! ## Example
//!
//! ```rust
//! use cohrx_core::iq_imbalance::compensate_iq_imbalance_with_params;
//! use num_complex::Complex64;
//! use std::f64::consts::PI;
//!
//! // Q leaks 10% of I and is 20% hot
//! let samples: Vec<Complex64> = (0..1000)
//!     .map(|n| {
//!         let w = 2.0 * PI * 13.0 * n as f64 / 1000.0;
//!         Complex64::new(w.cos(), 1.2 * (w.sin() + 0.1 * w.cos()))
//!     })
//!     .collect();
//!
//! let (balanced, params) = compensate_iq_imbalance_with_params(&samples).unwrap();
//! assert!(params.phase_inbalance < 0.0);
//! assert_eq!(balanced.len(), samples.len());
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::types::{complex_ops, DspError, DspResult, IQSample};

/// Below this `|cos φ|` the balancing rotation is treated as singular.
pub const COS_EPSILON: f64 = 1e-12;

/// Centered samples within this many ulps of the block's DC level and
/// spread are treated as mean-removal roundoff, i.e. zero power.
pub const ROUNDOFF_ULPS: f64 = 16.0;

/// Imbalance estimated from one block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceParams {
    /// Hybrid phase error in radians
    pub phase_inbalance: f64,
    /// Power ratio of I to the phase-corrected Q
    pub amp_inbalance: f64,
    /// Block mean removed before estimation
    pub dc_offset: Complex64,
}

impl ImbalanceParams {
    /// Phase error in degrees
    pub fn phase_deg(&self) -> f64 {
        self.phase_inbalance.to_degrees()
    }

    /// Amplitude imbalance as a power ratio in dB
    pub fn amp_db(&self) -> f64 {
        10.0 * self.amp_inbalance.log10()
    }

    /// Linear gain applied to the balanced Q rail
    pub fn q_gain(&self) -> f64 {
        self.amp_inbalance.sqrt()
    }

    /// Apply these parameters to another block.
    ///
    /// Subtracts the stored `dc_offset` (not the new block's own mean) and
    /// applies the same rotation and gain. Fails only if the stored phase is
    /// itself singular.
    pub fn apply(&self, samples: &[IQSample]) -> DspResult<Vec<IQSample>> {
        let rotation = Rotation::from_phase(self.phase_inbalance)?;
        let gain = self.q_gain();
        Ok(samples
            .iter()
            .map(|&s| rotation.balance(s - self.dc_offset, gain))
            .collect())
    }
}

/// `sin φ` / `cos φ` pair of a validated phase estimate
#[derive(Debug, Clone, Copy)]
struct Rotation {
    sin: f64,
    cos: f64,
}

impl Rotation {
    fn from_phase(phase: f64) -> DspResult<Self> {
        let cos = phase.cos();
        if !(cos.abs() >= COS_EPSILON) {
            return Err(DspError::Domain(format!(
                "phase error {:.6} rad is too close to ±90°; balancing rotation is singular",
                phase
            )));
        }
        Ok(Self {
            sin: phase.sin(),
            cos,
        })
    }

    /// Q rotated onto the axis orthogonal to I
    #[inline]
    fn balanced_q(&self, i: f64, q: f64) -> f64 {
        (q + self.sin * i) / self.cos
    }

    #[inline]
    fn balance(&self, centered: IQSample, gain: f64) -> IQSample {
        Complex64::new(centered.re, self.balanced_q(centered.re, centered.im) * gain)
    }
}

/// Full estimation state for one block
#[derive(Debug, Clone, Copy)]
struct Estimate {
    params: ImbalanceParams,
    rotation: Rotation,
}

fn estimate(samples: &[IQSample]) -> DspResult<Estimate> {
    if samples.is_empty() {
        return Err(DspError::Shape("IQ block is empty".into()));
    }
    if let Some(index) = complex_ops::first_non_finite(samples) {
        return Err(DspError::NonFiniteInput { index });
    }

    let dc_offset = complex_ops::mean(samples);
    let peak = complex_ops::peak_component(samples);
    if peak == 0.0 {
        return Err(DspError::DegenerateInput(
            "I channel carries no power after mean removal".into(),
        ));
    }

    // Moments are taken at unit peak; mon and amp are ratios, so this only
    // keeps the squares clear of overflow and underflow.
    let n = samples.len() as f64;
    let mean = dc_offset / peak;
    let centered = |s: IQSample| s / peak - mean;

    let (sum_ii, sum_iq, spread) = samples.iter().fold((0.0, 0.0, 0.0f64), |(ii, iq, spread), &s| {
        let c = centered(s);
        (ii + c.re * c.re, iq + c.re * c.im, spread.max(c.re.abs()).max(c.im.abs()))
    });
    let resolution = ROUNDOFF_ULPS * f64::EPSILON * (mean.re.abs().max(mean.im.abs()) + spread);
    let floor = n * resolution * resolution;
    if sum_ii <= floor {
        return Err(DspError::DegenerateInput(
            "I channel carries no power after mean removal".into(),
        ));
    }

    let mon = sum_iq / sum_ii;
    if !(mon.abs() <= 1.0) {
        return Err(DspError::Domain(format!(
            "normalized I/Q cross-moment {} is outside [-1, 1]",
            mon
        )));
    }
    let phase_inbalance = (-mon).asin();
    let rotation = Rotation::from_phase(phase_inbalance)?;

    let sum_qq: f64 = samples
        .iter()
        .map(|&s| {
            let c = centered(s);
            let q = rotation.balanced_q(c.re, c.im);
            q * q
        })
        .sum();
    // Dividing by cos φ amplifies the roundoff by the same factor
    if sum_qq <= floor / (rotation.cos * rotation.cos) {
        return Err(DspError::DegenerateInput(
            "Q channel carries no power after orthogonalization".into(),
        ));
    }

    Ok(Estimate {
        params: ImbalanceParams {
            phase_inbalance,
            amp_inbalance: sum_ii / sum_qq,
            dc_offset,
        },
        rotation,
    })
}

/// Estimate phase and amplitude imbalance without correcting the block.
pub fn estimate_iq_imbalance(samples: &[IQSample]) -> DspResult<ImbalanceParams> {
    estimate(samples).map(|e| e.params)
}

/// Remove DC, orthogonalize Q against I and balance their power.
pub fn compensate_iq_imbalance(samples: &[IQSample]) -> DspResult<Vec<IQSample>> {
    compensate_iq_imbalance_with_params(samples).map(|(out, _)| out)
}

/// As [`compensate_iq_imbalance`], also returning the estimate.
pub fn compensate_iq_imbalance_with_params(
    samples: &[IQSample],
) -> DspResult<(Vec<IQSample>, ImbalanceParams)> {
    let mut output = samples.to_vec();
    let params = compensate_iq_imbalance_inplace(&mut output)?;
    Ok((output, params))
}

/// Compensate a caller-owned buffer in place.
///
/// On error the buffer is left untouched.
pub fn compensate_iq_imbalance_inplace(samples: &mut [IQSample]) -> DspResult<ImbalanceParams> {
    let Estimate { params, rotation } = estimate(samples)?;
    let gain = params.q_gain();
    for s in samples.iter_mut() {
        *s = rotation.balance(*s - params.dc_offset, gain);
    }

    tracing::trace!(
        samples = samples.len(),
        phase_deg = params.phase_deg(),
        amp_db = params.amp_db(),
        "IQ imbalance compensated"
    );
    Ok(params)
}
