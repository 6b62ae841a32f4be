//! Unified error hierarchy for RecoveryRS
//!
//! The recovery and rest-timing computations never fail: degenerate input is
//! normalised to a safe default instead. Errors only exist at the edges of the
//! crate, where configuration is loaded and external payloads are ingested.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all RecoveryRS operations
#[derive(Debug, Error)]
pub enum RecoveryRsError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors while ingesting an external payload
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    /// A rest threshold row is unusable
    #[error("Invalid rest thresholds for {category}: {reason}")]
    InvalidThresholds { category: String, reason: String },

    /// A recovery default is negative or not a number
    #[error("Invalid recovery default {field}={value}")]
    InvalidRecoveryDefault { field: String, value: f64 },

    /// Serialization of the config failed
    #[error("Failed to serialize configuration: {reason}")]
    Serialize { reason: String },
}

/// Errors raised by the strict ingestion helpers
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Timestamp string is not ISO-8601
    #[error("Invalid timestamp in {field}: {value}")]
    InvalidTimestamp { field: String, value: String },

    /// Exercise category is not `compound` or `isolation`
    #[error("Unknown exercise category: {value}")]
    UnknownCategory { value: String },

    /// Required field missing from payload
    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

/// Result type alias for RecoveryRS operations
pub type Result<T> = std::result::Result<T, RecoveryRsError>;

impl RecoveryRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RecoveryRsError::Config(ConfigError::NotFound { .. }) => ErrorSeverity::Warning,
            RecoveryRsError::Ingestion(_) => ErrorSeverity::Warning,
            RecoveryRsError::Config(_) => ErrorSeverity::Error,
            RecoveryRsError::Io(_) => ErrorSeverity::Error,
            RecoveryRsError::Json(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RecoveryRsError::Config(ConfigError::NotFound { path }) => {
                format!("No configuration at {}, run `recoveryrs config --init`", path.display())
            }
            RecoveryRsError::Config(ConfigError::InvalidThresholds { category, reason }) => {
                format!("Rest thresholds for {} are invalid: {}", category, reason)
            }
            RecoveryRsError::Ingestion(IngestionError::InvalidTimestamp { field, .. }) => {
                format!("The {} value is not a valid date/time.", field)
            }
            _ => self.to_string(),
        }
    }

    /// Emit the error as a tracing event at its severity
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Error => tracing::error!(error = %self, "{}", self.user_message()),
            ErrorSeverity::Warning => tracing::warn!(error = %self, "{}", self.user_message()),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}
