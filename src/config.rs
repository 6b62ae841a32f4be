//! TOML configuration: rest thresholds, recovery defaults and logging

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::LogConfig;
use crate::models::FatigueSourceWire;
use crate::numeric::Numeric;
use crate::rest_zones::RestThresholdTable;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Rest goal/ceiling per exercise category
    #[serde(default)]
    pub rest: RestThresholdTable,

    /// Recovery defaults and capability gates
    #[serde(default)]
    pub recovery: RecoverySettings,

    /// Logging setup for the CLI
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Recovery-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySettings {
    /// Recovery hours assumed for a muscle group entry that has none
    pub default_muscle_recovery_hours: f64,

    /// Recovery hours assumed for a CNS entry that has none
    pub default_cns_recovery_hours: f64,

    /// Whether CNS load is tracked for this user
    pub cns_tracking_enabled: bool,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            default_muscle_recovery_hours: 48.0,
            default_cns_recovery_hours: 72.0,
            cns_tracking_enabled: false,
        }
    }
}

impl RecoverySettings {
    /// Fill missing `recovery_hours` on a muscle entry
    pub fn apply_muscle_default(&self, wire: &mut FatigueSourceWire) {
        if wire.recovery_hours.is_absent() {
            wire.recovery_hours = Numeric::Value(self.default_muscle_recovery_hours);
        }
    }

    /// Fill missing `recovery_hours` on the CNS entry
    pub fn apply_cns_default(&self, wire: &mut FatigueSourceWire) {
        if wire.recovery_hours.is_absent() {
            wire.recovery_hours = Numeric::Value(self.default_cns_recovery_hours);
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (field, value) in [
            ("default_muscle_recovery_hours", self.default_muscle_recovery_hours),
            ("default_cns_recovery_hours", self.default_cns_recovery_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRecoveryDefault {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            rest: RestThresholdTable::default(),
            recovery: RecoverySettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// The threshold table and recovery defaults are validated before the
    /// config is returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            reason: e.to_string(),
        })?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".recoveryrs")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults when the file does not exist
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.rest.validate()?;
        self.recovery.validate()
    }
}
