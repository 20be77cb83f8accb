//! # bhap-telemetry
//!
//! Structured logging for the BHAP binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bhap_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Log output is configured until the guard drops.
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BHAP_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `BHAP_JSON_LOGS` | `false` | JSON lines instead of pretty output |
//! | `BHAP_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `BHAP_SERVICE_NAME` | `bhap` | Service name in the startup line |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install the global subscriber described by `config`.
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Keeps telemetry active for the life of the process.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Span for one governance operation.
///
/// ```rust,ignore
/// let _span = operation_span!("publish", reference = %reference).entered();
/// ```
#[macro_export]
macro_rules! operation_span {
    ($name:expr) => {
        tracing::info_span!("operation", name = $name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!("operation", name = $name, $($field)*)
    };
}
