//! # Service Container
//!
//! Opens the configured store and wires it into a governance service with
//! the CLI's identity resolver and a logging event sink.

pub mod config;

pub use config::{ConfigError, RuntimeConfig, StorageBackend, StorageConfig};

use crate::adapters::EmailIdentityResolver;
use bhap_governance::{
    EntityStore, GovernanceDependencies, GovernanceService, LoggingEventSink,
};
use std::sync::Arc;
use tracing::info;

/// The service as the CLI runs it.
pub type CliService<S> = GovernanceService<S, EmailIdentityResolver<S>, LoggingEventSink>;

/// Wire `store` into a service configured by `config`.
pub fn build_service<S: EntityStore>(store: S, config: &RuntimeConfig) -> CliService<S> {
    let store = Arc::new(store);
    info!(
        transition_retries = config.governance.transition_retries,
        "Governance service ready"
    );
    GovernanceService::new(GovernanceDependencies {
        identity: Arc::new(EmailIdentityResolver::new(Arc::clone(&store))),
        store,
        events: Arc::new(LoggingEventSink),
        config: config.governance.clone(),
    })
}
