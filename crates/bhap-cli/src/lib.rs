//! # bhap
//!
//! Command-line front end for BHAP governance.
//!
//! ## Modular Structure
//!
//! - `cli` - clap command definitions
//! - `container/` - runtime configuration and service wiring
//! - `adapters/` - identity resolution by member email
//! - `commands` - dispatch to the governance API and text rendering
//!
//! ## Startup Sequence
//!
//! 1. Parse flags
//! 2. Load configuration (defaults, environment, flags) and validate it
//! 3. Install logging
//! 4. Open the store and wire the service
//! 5. Run the command and print its output

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod container;

use anyhow::{Context, Result};
use bhap_governance::EntityStore;
use bhap_store::{FileBackedKVStore, InMemoryKVStore, KvEntityStore};
use tracing::Instrument;

use crate::cli::{Cli, Command};
use crate::container::{build_service, RuntimeConfig, StorageBackend};

/// Apply command-line flags over `config`.
pub fn apply_flags(mut config: RuntimeConfig, cli: &Cli) -> RuntimeConfig {
    if let Some(path) = &cli.data_file {
        config.storage.data_file = path.clone();
        config.storage.backend = StorageBackend::File;
    }
    if cli.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if cli.verbose {
        config.telemetry = config.telemetry.verbose();
    }
    config
}

/// Open the configured store and run `command` against it.
pub async fn run(config: &RuntimeConfig, command: Command) -> Result<String> {
    match config.storage.backend {
        StorageBackend::Memory => {
            let store = KvEntityStore::open(InMemoryKVStore::new())
                .context("opening in-memory store")?;
            run_with_store(store, config, command).await
        }
        StorageBackend::File => {
            let path = &config.storage.data_file;
            let kv = FileBackedKVStore::open(path)
                .with_context(|| format!("opening data file {}", path.display()))?;
            let store = KvEntityStore::open(kv)
                .with_context(|| format!("reading records from {}", path.display()))?;
            run_with_store(store, config, command).await
        }
    }
}

/// Run `command` against an already opened store.
pub async fn run_with_store<S: EntityStore>(
    store: S,
    config: &RuntimeConfig,
    command: Command,
) -> Result<String> {
    let name = command.name();
    let service = build_service(store, config);
    let output = commands::execute(&service, command, config.governance.id_padding)
        .instrument(bhap_telemetry::operation_span!(name))
        .await
        .with_context(|| format!("{name} failed"))?;
    Ok(output)
}
