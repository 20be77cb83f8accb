//! Key-value store errors

use bhap_governance::StoreError;

/// Errors raised by a [`KeyValueStore`](crate::ports::KeyValueStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KVStoreError {
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },

    #[error("KV store locked by another process: {path}")]
    Locked { path: String },
}

impl KVStoreError {
    pub(crate) fn io(err: impl std::fmt::Display) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

impl From<KVStoreError> for StoreError {
    fn from(err: KVStoreError) -> Self {
        match err {
            KVStoreError::CorruptionError { message } => StoreError::Serialization(message),
            other => StoreError::Io(other.to_string()),
        }
    }
}
