//! # Coherent Receiver Front-End Compensation
//!
//! This crate corrects two analog impairments of a coherent optical
//! receiver before the rest of the DSP chain sees the samples:
//!
//! - **IQ imbalance**: phase and amplitude mismatch between I and Q left by
//!   a non-ideal 90° optical hybrid, estimated blindly from one block
//! - **RF delay**: unequal propagation delay between the hybrid outputs and
//!   the ADC lanes, removed with an ideal fractional delay
//!
//! ## Signal Flow
//!
//! ```text
//! ADC lanes ─► RF delay (per lane) ─► pair into I + jQ ─► IQ imbalance ─► DSP
//! ```
//!
//! Both compensators are pure functions of the block they are handed and
//! may be used independently, in any order, from any number of threads.
//! [`frontend::FrontendCompensator`] chains them in the order above.
//!
//! ## Example
//!
//! ```rust
//! use cohrx_core::prelude::*;
//! use num_complex::Complex64;
//! use std::f64::consts::PI;
//!
//! let clean: Vec<Complex64> = (0..1024)
//!     .map(|n| Complex64::from_polar(1.0, 2.0 * PI * 40.0 * n as f64 / 1024.0))
//!     .collect();
//!
//! // Hybrid with 5° skew and a 1 dB hot Q arm
//! let measured = HybridImpairment::from_degrees_db(5.0, 1.0).apply(&clean);
//! let balanced = compensate_iq_imbalance(&measured).unwrap();
//! assert!((balanced[3] - clean[3]).norm() < 1e-9);
//!
//! // Shift a lane 7 ps later at 50 GS/s
//! let lane: Vec<f64> = clean.iter().map(|s| s.re).collect();
//! let shifted = compensate_rf_delay_slice(&lane, 7e-12, DEFAULT_SAMPLE_RATE).unwrap();
//! assert_eq!(shifted.len(), lane.len());
//! ```

pub mod block;
pub mod config;
pub mod fft_utils;
pub mod frontend;
pub mod impairments;
pub mod iq_imbalance;
pub mod logging;
pub mod rf_delay;
pub mod types;

pub use block::SampleBlock;
pub use config::{CohrxConfig, ConfigError, FrontendConfig, LaneDelays};
pub use frontend::{FrontendCompensator, FrontendOutput, FrontendStats};
pub use iq_imbalance::{
    compensate_iq_imbalance, compensate_iq_imbalance_inplace, compensate_iq_imbalance_with_params,
    estimate_iq_imbalance, ImbalanceParams,
};
pub use rf_delay::{compensate_rf_delay, compensate_rf_delay_slice, RfDelayCompensator, DEFAULT_SAMPLE_RATE};
pub use types::{Complex, DspError, DspResult, IQSample, Sample};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::block::SampleBlock;
    pub use crate::impairments::HybridImpairment;
    pub use crate::iq_imbalance::{compensate_iq_imbalance, estimate_iq_imbalance, ImbalanceParams};
    pub use crate::rf_delay::{compensate_rf_delay, compensate_rf_delay_slice, DEFAULT_SAMPLE_RATE};
    pub use crate::types::{DspError, DspResult, IQSample};
}
