pub mod local_backend;

use chunkvault_types::error::Result;

/// Abstraction over the byte store that holds chunk payloads and the
/// persisted metadata index, addressed by `/`-separated keys.
pub trait StorageBackend: Send + Sync {
    /// Read the full value at `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `data` at `key`. Implementations must be atomic: a reader never
    /// observes a partially written value, even across a crash.
    fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Delete the value at `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Whether a value exists at `key`.
    fn exists(&self, key: &str) -> Result<bool>;

    /// List all keys under `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
