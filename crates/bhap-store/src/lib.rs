//! # bhap-store
//!
//! Durable Entity Store for BHAP governance records.
//!
//! ## Architecture
//!
//! ```text
//! GovernanceService ──→ [EntityStore] ──→ KvEntityStore
//!                                              ↓
//!                                      [KeyValueStore]
//!                                    ┌─────────┴─────────┐
//!                            InMemoryKVStore     FileBackedKVStore
//! ```
//!
//! ## Guarantees
//!
//! | Guarantee | Description |
//! |-----------|-------------|
//! | Atomic writes | A record and its index entries land in one batch |
//! | Unique IDs | A permanent ID maps to at most one proposal |
//! | No reissue | The last allocated ID is persisted before it is handed out |
//! | Single writer | The file store holds an exclusive lock while open |
//!
//! ## Usage
//!
//! ```ignore
//! use bhap_store::{FileBackedKVStore, KvEntityStore};
//!
//! let kv = FileBackedKVStore::open("data/bhap.db")?;
//! let store = KvEntityStore::open(kv)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod entity_store;
pub mod ports;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
pub use domain::{KVStoreError, KeyPrefix};
pub use entity_store::KvEntityStore;
pub use ports::{BatchOperation, KeyValueStore};
