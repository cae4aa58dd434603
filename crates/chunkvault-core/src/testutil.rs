use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chunkvault_types::error::{Result, VaultError};

use crate::config::VaultConfig;
use crate::storage::StorageBackend;
use crate::vault::Vault;

/// In-memory storage backend for testing. Thread-safe via Mutex.
pub struct MemoryBackend {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self.data.lock().unwrap();
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let mut map = self.data.lock().unwrap();
        map.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut map = self.data.lock().unwrap();
        map.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let map = self.data.lock().unwrap();
        Ok(map.contains_key(key))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let map = self.data.lock().unwrap();
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Shared handle to inspect which keys were written via `put()`.
#[derive(Clone)]
pub struct PutLog(Arc<Mutex<Vec<String>>>);

impl PutLog {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    /// All keys written via `put()` since the last `clear()`.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    fn record(&self, key: &str) {
        self.0.lock().unwrap().push(key.to_string());
    }
}

/// Storage wrapper that records which keys were passed to `put()`.
/// Use `RecordingBackend::new()` to get the backend and a shared `PutLog`.
pub struct RecordingBackend {
    inner: MemoryBackend,
    log: PutLog,
}

impl RecordingBackend {
    pub fn new() -> (Self, PutLog) {
        let log = PutLog::new();
        (
            Self {
                inner: MemoryBackend::new(),
                log: log.clone(),
            },
            log,
        )
    }
}

impl StorageBackend for RecordingBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }
    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.log.record(key);
        self.inner.put(key, data)
    }
    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }
    fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key)
    }
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }
}

/// Storage wrapper that fails every `put()` whose key starts with a given
/// prefix. Other operations delegate to an inner `MemoryBackend`.
pub struct FailingPutBackend {
    inner: MemoryBackend,
    fail_prefix: String,
}

impl FailingPutBackend {
    pub fn new(fail_prefix: &str) -> Self {
        Self {
            inner: MemoryBackend::new(),
            fail_prefix: fail_prefix.to_string(),
        }
    }
}

impl StorageBackend for FailingPutBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }
    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        if key.starts_with(&self.fail_prefix) {
            return Err(VaultError::Other(format!("injected put failure for {key}")));
        }
        self.inner.put(key, data)
    }
    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }
    fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key)
    }
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }
}

/// Open a vault backed by a fresh `MemoryBackend` with a small chunk size,
/// so tests can exercise multi-chunk streams with tiny inputs.
pub fn test_vault_with_chunk_size(chunk_size: usize) -> Vault {
    let mut config = VaultConfig::default();
    config.chunker.chunk_size = chunk_size;
    Vault::open(Arc::new(MemoryBackend::new()), config)
        .expect("failed to open test vault")
}

/// Open a vault over a caller-supplied backend with the given chunk size.
pub fn vault_over(backend: Arc<dyn StorageBackend>, chunk_size: usize) -> Vault {
    let mut config = VaultConfig::default();
    config.chunker.chunk_size = chunk_size;
    Vault::open(backend, config).expect("failed to open test vault")
}
