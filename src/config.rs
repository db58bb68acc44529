//! Session configuration parameters
//!
//! All tunable parameters for one cooler session. Loaded from JSON by the
//! demo binary; embedders usually start from [`SessionConfig::default`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::gatt::WriteType;

/// Core session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    // --- Discovery ---
    /// Advertised name of the cooler (matched case-insensitively)
    pub device_name: String,
    /// Give up on a connection attempt after this many seconds
    pub connect_timeout_secs: u32,

    // --- Timing ---
    /// FSM tick interval (milliseconds)
    pub tick_interval_ms: u32,

    // --- Writes ---
    /// Acknowledgement mode for characteristic writes
    pub write_type: WriteType,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_name: String::from("XTrailCooler"),
            connect_timeout_secs: 15,
            tick_interval_ms: 250, // 4 Hz
            write_type: WriteType::WithResponse,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("device_name must not be empty"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "connect_timeout_secs must be positive",
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "tick_interval_ms must be positive",
            ));
        }
        if u64::from(self.tick_interval_ms) > u64::from(self.connect_timeout_secs) * 1000 {
            return Err(ConfigError::ValidationFailed(
                "tick_interval_ms must not exceed the connect timeout",
            ));
        }
        Ok(())
    }

    /// Duration of one tick in seconds.
    pub fn tick_period_secs(&self) -> f32 {
        self.tick_interval_ms as f32 / 1000.0
    }
}

/// Errors from loading or validating a [`SessionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON for this schema.
    Parse(String),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
