//! File-backed key-value store
//!
//! The whole map is held in memory and rewritten to disk after every
//! mutation, via a temp file and rename so a crash never leaves a torn file.
//! An exclusive `fs2` lock on `<path>.lock` keeps a second process out for
//! the lifetime of the store.
//!
//! ## File Format
//!
//! ```text
//! b"BHAPKV01" ([key_len: u32 LE][key][value_len: u32 LE][value])*
//! ```

use super::memory::{apply_batch, scan_prefix};
use crate::domain::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 8] = b"BHAPKV01";

/// Durable key-value store in a single file.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
    /// Held open to keep the advisory lock.
    _lock: File,
}

impl FileBackedKVStore {
    /// Open (or create) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(KVStoreError::io)?;
        }
        let lock = Self::acquire_lock(&path)?;

        let data = match fs::read(&path) {
            Ok(bytes) => {
                let data = decode(&bytes)?;
                tracing::info!(
                    "[bhap-store] Loaded {} keys from {} ({} bytes)",
                    data.len(),
                    path.display(),
                    bytes.len()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("[bhap-store] No existing data file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(KVStoreError::io(e)),
        };

        Ok(Self {
            data,
            path,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn acquire_lock(path: &Path) -> Result<File, KVStoreError> {
        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(KVStoreError::io)?;
        file.try_lock_exclusive().map_err(|_| KVStoreError::Locked {
            path: lock_path.display().to_string(),
        })?;
        Ok(file)
    }

    /// Persist `data`, then adopt it. On failure the store is unchanged.
    fn commit(&mut self, data: BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), KVStoreError> {
        let bytes = encode(&data);
        let temp_path = self.path.with_extension("tmp");

        let mut file = File::create(&temp_path).map_err(KVStoreError::io)?;
        file.write_all(&bytes).map_err(KVStoreError::io)?;
        file.sync_all().map_err(KVStoreError::io)?;
        fs::rename(&temp_path, &self.path).map_err(KVStoreError::io)?;

        self.data = data;
        Ok(())
    }
}

fn encode(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    for (key, value) in data {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    bytes
}

fn decode(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
    let body = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or_else(|| KVStoreError::CorruptionError {
            message: "missing file header".into(),
        })?;

    let mut reader = Reader { body, cursor: 0 };
    let mut data = BTreeMap::new();
    while !reader.is_done() {
        let key = reader.take_len_prefixed()?;
        let value = reader.take_len_prefixed()?;
        data.insert(key, value);
    }
    Ok(data)
}

struct Reader<'a> {
    body: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    fn is_done(&self) -> bool {
        self.cursor >= self.body.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], KVStoreError> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|end| *end <= self.body.len())
            .ok_or_else(|| KVStoreError::CorruptionError {
                message: format!("truncated record at byte {}", self.cursor),
            })?;
        let chunk = &self.body[self.cursor..end];
        self.cursor = end;
        Ok(chunk)
    }

    fn take_len_prefixed(&mut self) -> Result<Vec<u8>, KVStoreError> {
        let raw = self.take(4)?;
        let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        Ok(self.take(len)?.to_vec())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.atomic_batch_write(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.atomic_batch_write(vec![BatchOperation::delete(key)])
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut next = self.data.clone();
        apply_batch(&mut next, operations);
        self.commit(next)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        Ok(scan_prefix(&self.data, prefix))
    }
}
