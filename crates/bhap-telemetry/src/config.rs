//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to the root span
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error), or a full
    /// `EnvFilter` directive such as `bhap_governance=debug,info`
    pub log_level: String,

    /// Whether to write logs to stderr at all
    pub console_output: bool,

    /// Whether to format logs as JSON lines
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "bhap".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BHAP_SERVICE_NAME`: Service name (default: bhap)
    /// - `BHAP_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `BHAP_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `BHAP_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            service_name: lookup("BHAP_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("BHAP_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("BHAP_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("BHAP_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    /// Raise the filter to `debug` unless a more specific one was configured.
    pub fn verbose(mut self) -> Self {
        if self.log_level == "info" {
            self.log_level = "debug".to_string();
        }
        self
    }
}
