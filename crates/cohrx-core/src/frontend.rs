//! Front-end pipeline
//!
//! Chains the two compensators the way a coherent receiver usually applies
//! them: deskew the real ADC lanes first, then pair them into complex
//! polarizations and balance each one.
//!
//! ```text
//!  XI ──► delay(-τ_xi) ─┐
//!                       ├─► X = XI + j·XQ ──► IQ compensation ──► X'
//!  XQ ──► delay(-τ_xq) ─┘
//!  YI ──► delay(-τ_yi) ─┐
//!                       ├─► Y = YI + j·YQ ──► IQ compensation ──► Y'
//!  YQ ──► delay(-τ_yq) ─┘
//! ```
//!
//! A two-lane block is treated as a single polarization (XI, XQ).
//!
//! A failing block is reported to the caller and counted; the pipeline keeps
//! no state from it and is ready for the next block.

use crate::block::SampleBlock;
use crate::config::{CohrxConfig, FrontendConfig};
use crate::iq_imbalance::{compensate_iq_imbalance_with_params, ImbalanceParams};
use crate::rf_delay::RfDelayCompensator;
use crate::types::{complex_ops, DspError, DspResult, IQSample};

/// Polarization names in output order
pub const POLARIZATIONS: [&str; 2] = ["X", "Y"];

/// Result of one front-end block.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendOutput {
    /// One complex sequence per polarization
    pub polarizations: Vec<Vec<IQSample>>,
    /// Estimated imbalance per polarization; `None` when IQ compensation is off
    pub params: Vec<Option<ImbalanceParams>>,
}

/// Block counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontendStats {
    pub processed: u64,
    pub dropped: u64,
}

/// Deskew + IQ balance for 2- or 4-lane ADC blocks.
#[derive(Debug)]
pub struct FrontendCompensator {
    config: FrontendConfig,
    /// Planned for the last row length seen
    delay: Option<RfDelayCompensator>,
    stats: FrontendStats,
}

impl FrontendCompensator {
    pub fn new(config: FrontendConfig) -> DspResult<Self> {
        config
            .validate()
            .map_err(|e| DspError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            config,
            delay: None,
            stats: FrontendStats::default(),
        })
    }

    /// Build from the active front-end section of a loaded config.
    pub fn from_config(config: &CohrxConfig) -> DspResult<Self> {
        Self::new(config.frontend.clone())
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn stats(&self) -> FrontendStats {
        self.stats
    }

    /// Compensate one block of lanes (rows XI, XQ[, YI, YQ]).
    pub fn process(&mut self, lanes: &SampleBlock<f64>) -> DspResult<FrontendOutput> {
        match self.run(lanes) {
            Ok(out) => {
                self.stats.processed += 1;
                Ok(out)
            }
            Err(e) => {
                self.stats.dropped += 1;
                tracing::warn!(error = %e, "front-end block dropped");
                Err(e)
            }
        }
    }

    fn run(&mut self, lanes: &SampleBlock<f64>) -> DspResult<FrontendOutput> {
        let n_lanes = lanes.rows();
        if n_lanes != 2 && n_lanes != 4 {
            return Err(DspError::Shape(format!(
                "expected 2 or 4 ADC lanes, got {}",
                n_lanes
            )));
        }

        let deskew: Vec<f64> = self.config.lane_delays.as_array()[..n_lanes]
            .iter()
            .map(|d| -d)
            .collect();
        let deskewed = if deskew.iter().all(|&d| d == 0.0) {
            lanes.clone()
        } else {
            self.delay_for(lanes.row_len())?
                .process_block_per_row(lanes, &deskew)?
        };

        let mut polarizations = Vec::with_capacity(n_lanes / 2);
        let mut params = Vec::with_capacity(n_lanes / 2);
        for (pol, name) in POLARIZATIONS.iter().enumerate().take(n_lanes / 2) {
            let iq = complex_ops::from_rails(deskewed.row(2 * pol), deskewed.row(2 * pol + 1));

            if self.config.compensate_iq {
                let (balanced, p) = compensate_iq_imbalance_with_params(&iq)?;
                tracing::debug!(
                    pol = *name,
                    phase_deg = p.phase_deg(),
                    amp_db = p.amp_db(),
                    "IQ imbalance estimated"
                );
                polarizations.push(balanced);
                params.push(Some(p));
            } else {
                polarizations.push(iq);
                params.push(None);
            }
        }

        Ok(FrontendOutput {
            polarizations,
            params,
        })
    }

    fn delay_for(&mut self, row_len: usize) -> DspResult<&mut RfDelayCompensator> {
        let plan = match self.delay.take() {
            Some(d) if d.row_len() == row_len => d,
            _ => {
                tracing::debug!(row_len, "planning deskew FFT");
                RfDelayCompensator::new(row_len, self.config.sample_rate)?
            }
        };
        Ok(self.delay.insert(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LaneDelays;
    use crate::impairments::{skew_lanes, HybridImpairment};
    use num_complex::Complex64;
    use std::f64::consts::PI;

    const FS: f64 = 50e9;
    const N: usize = 256;

    fn tone(bin: f64, phase: f64) -> Vec<IQSample> {
        (0..N)
            .map(|k| Complex64::from_polar(1.0, 2.0 * PI * bin * k as f64 / N as f64 + phase))
            .collect()
    }

    fn to_lanes(pols: &[Vec<IQSample>]) -> SampleBlock<f64> {
        let mut rows = Vec::new();
        for p in pols {
            rows.push(p.iter().map(|s| s.re).collect());
            rows.push(p.iter().map(|s| s.im).collect());
        }
        SampleBlock::from_rows(rows).unwrap()
    }

    fn assert_close(a: &[IQSample], b: &[IQSample], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (k, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).norm() < tol, "sample {}: {} vs {}", k, x, y);
        }
    }

    fn skews() -> LaneDelays {
        LaneDelays {
            xi: 0.0,
            xq: 0.3 / FS,
            yi: -0.45 / FS,
            yq: 1.2 / FS,
        }
    }

    #[test]
    fn test_deskew_only() {
        let clean = vec![tone(7.0, 0.1), tone(11.0, -0.7)];
        let delays = skews();
        let skewed = skew_lanes(&to_lanes(&clean), &delays.as_array(), FS).unwrap();

        let mut fe = FrontendCompensator::new(FrontendConfig {
            sample_rate: FS,
            lane_delays: delays,
            compensate_iq: false,
        })
        .unwrap();
        let out = fe.process(&skewed).unwrap();

        assert_eq!(out.polarizations.len(), 2);
        assert_eq!(out.params, vec![None, None]);
        assert_close(&out.polarizations[0], &clean[0], 1e-10);
        assert_close(&out.polarizations[1], &clean[1], 1e-10);
    }

    #[test]
    fn test_deskew_and_balance() {
        let clean = vec![tone(5.0, 0.0), tone(9.0, 0.4)];
        let hx = HybridImpairment::new(7f64.to_radians(), 1.15);
        let hy = HybridImpairment::new(-4f64.to_radians(), 0.9);
        let impaired = vec![hx.apply(&clean[0]), hy.apply(&clean[1])];

        let delays = skews();
        let skewed = skew_lanes(&to_lanes(&impaired), &delays.as_array(), FS).unwrap();

        let mut fe = FrontendCompensator::new(FrontendConfig {
            sample_rate: FS,
            lane_delays: delays,
            compensate_iq: true,
        })
        .unwrap();
        let out = fe.process(&skewed).unwrap();

        assert_close(&out.polarizations[0], &clean[0], 1e-9);
        assert_close(&out.polarizations[1], &clean[1], 1e-9);

        let px = out.params[0].unwrap();
        assert!((px.phase_inbalance - hx.expected_params().phase_inbalance).abs() < 1e-9);
        let py = out.params[1].unwrap();
        assert!((py.amp_inbalance - hy.expected_params().amp_inbalance).abs() < 1e-9);
        assert_eq!(fe.stats(), FrontendStats { processed: 1, dropped: 0 });
    }

    #[test]
    fn test_single_polarization() {
        let clean = vec![tone(3.0, 0.2)];
        let mut fe = FrontendCompensator::new(FrontendConfig::default()).unwrap();
        let out = fe.process(&to_lanes(&clean)).unwrap();

        assert_eq!(out.polarizations.len(), 1);
        assert_close(&out.polarizations[0], &clean[0], 1e-10);
        assert!(out.params[0].is_some());
    }

    #[test]
    fn test_wrong_lane_count() {
        let lanes = SampleBlock::from_rows(vec![vec![0.0; 8]; 3]).unwrap();
        let mut fe = FrontendCompensator::new(FrontendConfig::default()).unwrap();
        assert!(matches!(fe.process(&lanes), Err(DspError::Shape(_))));
        assert_eq!(fe.stats().dropped, 1);
    }

    #[test]
    fn test_failed_block_is_dropped_and_pipeline_recovers() {
        let mut fe = FrontendCompensator::new(FrontendConfig::default()).unwrap();

        let dead = SampleBlock::from_rows(vec![vec![0.0; N]; 4]).unwrap();
        let err = fe.process(&dead).unwrap_err();
        assert!(matches!(err, DspError::DegenerateInput(_)));

        let good = to_lanes(&[tone(4.0, 0.0), tone(6.0, 0.0)]);
        assert!(fe.process(&good).is_ok());
        assert_eq!(fe.stats(), FrontendStats { processed: 1, dropped: 1 });
    }

    #[test]
    fn test_replans_on_new_row_length() {
        let mut fe = FrontendCompensator::new(FrontendConfig {
            lane_delays: skews(),
            ..Default::default()
        })
        .unwrap();

        let short = SampleBlock::from_rows(vec![vec![1.0, -1.0, 0.5, 0.25]; 2]).unwrap();
        let long = SampleBlock::from_rows(vec![vec![1.0, -1.0, 0.5, 0.25, 0.0, 0.7]; 2]).unwrap();

        // Identical I and Q rows are fully correlated; only shapes matter here
        let _ = fe.process(&short);
        assert_eq!(fe.delay.as_ref().map(|d| d.row_len()), Some(4));
        let _ = fe.process(&long);
        assert_eq!(fe.delay.as_ref().map(|d| d.row_len()), Some(6));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = FrontendCompensator::new(FrontendConfig {
            sample_rate: -5.0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, DspError::InvalidParameter(_)));
    }

    #[test]
    fn test_from_config() {
        let config = CohrxConfig::parse("frontend:\n  compensate_iq: false\n").unwrap();
        let fe = FrontendCompensator::from_config(&config).unwrap();
        assert!(!fe.config().compensate_iq);
    }
}
