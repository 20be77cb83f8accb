//! # Runtime Configuration
//!
//! Defaults, then environment overrides, then command-line flags.

use bhap_governance::GovernanceConfig;
use bhap_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Governance service configuration.
    pub governance: GovernanceConfig,
    /// Log output configuration.
    pub telemetry: TelemetryConfig,
}

/// Where governance records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Records vanish when the process exits.
    Memory,
    #[default]
    File,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Data file for the file backend.
    pub data_file: PathBuf,
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./data/bhap.db"),
            backend: StorageBackend::File,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown storage backend {0:?} (expected \"memory\" or \"file\")")]
    UnknownBackend(String),

    #[error("transition retry budget must be at least 1")]
    ZeroRetryBudget,

    #[error("the file backend needs a data file path")]
    MissingDataFile,
}

impl RuntimeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden from an arbitrary variable lookup.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = RuntimeConfig {
            telemetry: TelemetryConfig::from_lookup(&lookup),
            ..Default::default()
        };

        if let Some(path) = lookup("BHAP_DATA_FILE") {
            config.storage.data_file = PathBuf::from(path);
        }
        if let Some(backend) = lookup("BHAP_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(backend) => config.storage.backend = backend,
                Err(e) => warn!("Ignoring BHAP_STORAGE_BACKEND: {}", e),
            }
        }
        if let Some(retries) = lookup("BHAP_TRANSITION_RETRIES") {
            match retries.parse() {
                Ok(retries) => config.governance.transition_retries = retries,
                Err(_) => warn!("Ignoring BHAP_TRANSITION_RETRIES: not a number: {}", retries),
            }
        }

        config
    }

    /// Reject settings the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.governance.transition_retries == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }
        if self.storage.backend == StorageBackend::File
            && self.storage.data_file.as_os_str().is_empty()
        {
            return Err(ConfigError::MissingDataFile);
        }
        Ok(())
    }
}
