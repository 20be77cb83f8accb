//! Subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{TelemetryConfig, TelemetryError};

/// Parse the configured level into a filter.
pub(crate) fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log filter {:?}: {e}", config.log_level)))
}

/// Install the global subscriber.
pub(crate) fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    let fmt_layer = if config.json_logs {
        // JSON lines for log shippers
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(config.console_output.then_some(fmt_layer))
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Tracing initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_levels_and_directives() {
        for level in ["info", "debug", "bhap_governance=trace,warn"] {
            let config = TelemetryConfig {
                log_level: level.into(),
                ..Default::default()
            };
            assert!(build_filter(&config).is_ok(), "{level}");
        }
    }

    #[test]
    fn test_filter_rejects_bad_level() {
        let config = TelemetryConfig {
            log_level: "bhap_store=loud".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_filter(&config),
            Err(TelemetryError::Config(_))
        ));
    }
}
