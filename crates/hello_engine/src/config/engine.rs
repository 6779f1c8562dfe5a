//! Engine and host configuration structures

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::time::FramePacer;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame loop and module management
    pub host: HostConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl Config for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.host.validate()?;
        self.logging.level_filter()?;
        Ok(())
    }

    fn toml_unset_fields(&self) -> Vec<&'static str> {
        let mut unset = Vec::new();
        if self.host.max_frames.is_none() {
            unset.push("host.max_frames");
        }
        if self.host.target_tick_rate.is_none() {
            unset.push("host.target_tick_rate");
        }
        unset
    }
}

/// What the host does when a module fails to initialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitFailurePolicy {
    /// Finalize everything already initialized and return the error
    Abort,

    /// Log the failure and run without the module
    #[default]
    Skip,
}

/// Module host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Stop after this many frames; `None` runs until stopped
    pub max_frames: Option<u64>,

    /// Ticks per second; `None` ticks as fast as possible
    pub target_tick_rate: Option<f32>,

    /// Reaction to a module initialization failure
    pub init_failure_policy: InitFailurePolicy,

    /// End the frame loop when a module reports a fault
    pub stop_on_fault: bool,

    /// Modules the application should create, in registration order
    pub modules: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_frames: Some(600),
            target_tick_rate: Some(60.0),
            init_failure_policy: InitFailurePolicy::Skip,
            stop_on_fault: true,
            modules: vec!["frame_stats".to_string()],
        }
    }
}

impl HostConfig {
    /// Unpaced, unbounded host with no module list
    ///
    /// Useful for tests and for hosts that register modules by hand.
    pub const fn unbounded() -> Self {
        Self {
            max_frames: None,
            target_tick_rate: None,
            init_failure_policy: InitFailurePolicy::Skip,
            stop_on_fault: true,
            modules: Vec::new(),
        }
    }

    /// Builder: stop after `frames` frames
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Builder: set the initialization failure policy
    #[must_use]
    pub fn with_init_failure_policy(mut self, policy: InitFailurePolicy) -> Self {
        self.init_failure_policy = policy;
        self
    }

    /// Builder: pace ticks at `rate` per second
    #[must_use]
    pub fn with_tick_rate(mut self, rate: f32) -> Self {
        self.target_tick_rate = Some(rate);
        self
    }

    /// Check ranges serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rate) = self.target_tick_rate {
            if FramePacer::new(rate).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "target_tick_rate must be a positive number with a representable period, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter (`off`, `error`, `warn`, `info`, `debug`, `trace`)
    ///
    /// `RUST_LOG` still applies on top of this.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.level)))
    }
}
