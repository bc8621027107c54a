//! # Configuration System
//!
//! YAML configuration for applications running the front-end compensators:
//!
//! - Front-end settings (ADC sample rate, measured lane skews, IQ compensation)
//! - Logging
//! - Named hardware profiles, one per receiver/ADC combination
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `COHRX_CONFIG` environment variable
//! 2. `./cohrx.yaml` (current directory)
//! 3. `~/.config/cohrx/config.yaml` (user config)
//! 4. `/etc/cohrx/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! frontend:
//!   sample_rate: 50e9
//!   lane_delays:
//!     xi: 0.0
//!     xq: 3.5e-12
//!     yi: -1.2e-12
//!     yq: 0.8e-12
//!   compensate_iq: true
//!
//! logging:
//!   level: debug
//!   format: compact
//!
//! profiles:
//!   lab_scope_80g:
//!     sample_rate: 80e9
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::rf_delay::DEFAULT_SAMPLE_RATE;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "COHRX_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file or profile not found
    NotFound(String),
    /// Failed to read or write configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Measured RF path delay of each ADC lane, in seconds.
///
/// The front end removes these by delaying each lane by the negated value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneDelays {
    pub xi: f64,
    pub xq: f64,
    pub yi: f64,
    pub yq: f64,
}

impl LaneDelays {
    /// Delays in lane order XI, XQ, YI, YQ
    pub fn as_array(&self) -> [f64; 4] {
        [self.xi, self.xq, self.yi, self.yq]
    }

    /// Largest delay difference between any two lanes
    pub fn max_skew(&self) -> f64 {
        let d = self.as_array();
        let max = d.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = d.iter().copied().fold(f64::INFINITY, f64::min);
        max - min
    }
}

/// Front-end compensation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// ADC sample rate in Hz
    pub sample_rate: f64,
    /// Per-lane skew to remove
    pub lane_delays: LaneDelays,
    /// Run IQ imbalance compensation after deskew
    pub compensate_iq: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            lane_delays: LaneDelays::default(),
            compensate_iq: true,
        }
    }
}

impl FrontendConfig {
    /// Check values the compensators would otherwise reject per block.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::ValidationError(
                "sample_rate must be finite and positive".to_string(),
            ));
        }
        if self.lane_delays.as_array().iter().any(|d| !d.is_finite()) {
            return Err(ConfigError::ValidationError(
                "lane_delays must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohrxConfig {
    pub frontend: FrontendConfig,
    pub logging: LogConfig,
    /// Named hardware profiles
    pub profiles: HashMap<String, FrontendConfig>,
}

impl CohrxConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = Path::new(&path);
            if path.exists() {
                return Self::load_from(path);
            }
            tracing::warn!("{} points to missing file {}", CONFIG_ENV_VAR, path.display());
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Replace the front-end settings with a named hardware profile.
    pub fn with_profile(&self, name: &str) -> Result<Self, ConfigError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(format!("profile '{}' not found", name)))?;

        let mut config = self.clone();
        config.frontend = profile.clone();
        Ok(config)
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./cohrx.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "cohrx") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/cohrx/config.yaml"));
        paths
    }

    /// Validate the active front end and every profile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.frontend.validate()?;
        for (name, profile) in &self.profiles {
            profile
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("profile '{}': {}", name, e)))?;
        }
        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            frontend: FrontendConfig {
                lane_delays: LaneDelays {
                    xi: 0.0,
                    xq: 3.5e-12,
                    yi: -1.2e-12,
                    yq: 0.8e-12,
                },
                ..Default::default()
            },
            profiles: {
                let mut profiles = HashMap::new();
                profiles.insert(
                    "lab_scope_80g".to_string(),
                    FrontendConfig {
                        sample_rate: 80e9,
                        ..Default::default()
                    },
                );
                profiles.insert(
                    "single_pol_25g".to_string(),
                    FrontendConfig {
                        sample_rate: 25e9,
                        compensate_iq: false,
                        ..Default::default()
                    },
                );
                profiles
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
