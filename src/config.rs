//! Timeline configuration.
//!
//! A [`TimelineConfig`] describes how a [`Timeline`](crate::Timeline) starts:
//! an optional fixed start time and the initial time factor. It can be built
//! in code, read from the environment, or (with the `config-file` feature)
//! parsed from TOML.
//!
//! ```toml
//! start_time = 1700000000.0
//! time_factor = 0.0
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the start time in seconds since the epoch.
pub const ENV_START_TIME: &str = "TIMEWARP_START_TIME";
/// Environment variable holding the time factor.
pub const ENV_TIME_FACTOR: &str = "TIMEWARP_TIME_FACTOR";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value the timeline cannot use.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// An environment variable could not be parsed as a number.
    #[error("environment variable `{var}` is not a number: {value:?}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Initial state of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineConfig {
    /// Fixed virtual start time. `None` tracks real time until first mutated.
    pub start_time: Option<f64>,
    /// Ratio of virtual to real time advance. `0.0` freezes the clock.
    pub time_factor: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            start_time: None,
            time_factor: 1.0,
        }
    }
}

impl TimelineConfig {
    /// Configuration for a clock frozen at `start_time`.
    #[must_use]
    pub const fn frozen_at(start_time: f64) -> Self {
        Self {
            start_time: Some(start_time),
            time_factor: 0.0,
        }
    }

    /// Sets the start time.
    #[must_use]
    pub const fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Sets the time factor.
    #[must_use]
    pub const fn time_factor(mut self, factor: f64) -> Self {
        self.time_factor = factor;
        self
    }

    /// Checks that every field holds a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_factor.is_finite() || self.time_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "time_factor",
                reason: format!(
                    "must be a finite non-negative number, got {}",
                    self.time_factor
                ),
            });
        }
        if let Some(start) = self.start_time
            && !start.is_finite()
        {
            return Err(ConfigError::InvalidValue {
                field: "start_time",
                reason: format!("must be a finite number, got {start}"),
            });
        }
        Ok(())
    }

    /// Reads overrides from `TIMEWARP_START_TIME` and `TIMEWARP_TIME_FACTOR`.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_START_TIME) {
            config.start_time = Some(parse_env(ENV_START_TIME, &raw)?);
        }
        if let Some(raw) = lookup(ENV_TIME_FACTOR) {
            config.time_factor = parse_env(ENV_TIME_FACTOR, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

fn parse_env(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim().parse::<f64>().map_err(|_| ConfigError::Env {
        var,
        value: raw.to_string(),
    })
}
