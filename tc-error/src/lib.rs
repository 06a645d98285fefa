//! Unified error handling for thermcap
//!
//! A single error type shared by the sensor, cpufreq, config and shutdown
//! code paths. Startup-fatal variants carry their own process exit status.

use std::io;
use std::path::PathBuf;

/// Result type alias using ThermcapError
pub type Result<T> = std::result::Result<T, ThermcapError>;

/// Exit statuses for errors that abort startup
pub mod exit_code {
    pub const GENERIC: i32 = 1;
    pub const NO_SENSORS: i32 = 2;
    pub const NO_FREQUENCY_CONTROL: i32 = 3;
    pub const CONFIG: i32 = 4;
    /// EX_NOPERM from sysexits.h
    pub const INSUFFICIENT_PRIVILEGE: i32 = 77;
}

#[derive(thiserror::Error, Debug)]
pub enum ThermcapError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("No temperature sensors found under {root}")]
    NoSensorsFound {
        root: PathBuf,
    },

    #[error("Sensor {path} unreadable: {reason}")]
    SensorUnreadable {
        path: PathBuf,
        reason: String,
    },

    #[error("No CPU frequency control found at {path}")]
    NoFrequencyControl {
        path: PathBuf,
    },

    #[error("No CPU governor control found at {path}")]
    NoGovernorControl {
        path: PathBuf,
    },

    #[error("Insufficient privilege: {0}")]
    InsufficientPrivilege(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },
}

impl ThermcapError {
    /// Create an invalid config error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn sensor_unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SensorUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Process exit status to use when this error aborts startup
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoSensorsFound { .. } => exit_code::NO_SENSORS,
            Self::NoFrequencyControl { .. } | Self::NoGovernorControl { .. } => exit_code::NO_FREQUENCY_CONTROL,
            Self::InsufficientPrivilege(_) => exit_code::INSUFFICIENT_PRIVILEGE,
            Self::InvalidConfig { .. } | Self::JsonParse(_) => exit_code::CONFIG,
            _ => exit_code::GENERIC,
        }
    }
}
