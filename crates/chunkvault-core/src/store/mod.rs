use std::sync::Arc;

use tracing::{debug, warn};

use chunkvault_types::error::{Result, VaultError};
use chunkvault_types::ChunkHash;

use crate::compress::{self, Compression};
use crate::storage::StorageBackend;

/// Physical persistence of unique chunk payloads.
///
/// One payload file per hash at `chunks/<shard>/<hex>`, written through the
/// backend's atomic put and optionally compressed behind a codec tag. The
/// store knows nothing about which backups reference a chunk; lifetime is
/// governed entirely by the metadata index.
pub struct ChunkStore {
    storage: Arc<dyn StorageBackend>,
    compression: Compression,
}

impl ChunkStore {
    pub fn new(storage: Arc<dyn StorageBackend>, compression: Compression) -> Self {
        Self {
            storage,
            compression,
        }
    }

    /// Whether a payload for `hash` is physically present.
    pub fn has(&self, hash: &ChunkHash) -> Result<bool> {
        self.storage.exists(&hash.storage_key())
    }

    /// Write a payload if and only if it is not already present.
    /// A second `put` with the same hash is a cheap no-op, never an error and
    /// never a partial overwrite.
    pub fn put(&self, hash: &ChunkHash, data: &[u8]) -> Result<()> {
        let key = hash.storage_key();
        if self.storage.exists(&key)? {
            debug!(chunk = %hash, "payload already stored, skipping write");
            return Ok(());
        }
        let encoded = compress::compress(self.compression, data)?;
        self.storage.put(&key, &encoded)
    }

    /// Read and decode a payload.
    pub fn get(&self, hash: &ChunkHash) -> Result<Vec<u8>> {
        let encoded = self
            .storage
            .get(&hash.storage_key())?
            .ok_or(VaultError::ChunkNotFound(*hash))?;
        compress::decompress(&encoded).map_err(|e| VaultError::ChunkCorrupt {
            hash: *hash,
            reason: e.to_string(),
        })
    }

    /// Delete the physical payload. Removing an absent payload is logged but
    /// not an error.
    pub fn remove(&self, hash: &ChunkHash) -> Result<()> {
        let key = hash.storage_key();
        if !self.storage.exists(&key)? {
            warn!(chunk = %hash, "remove requested but no payload is stored");
            return Ok(());
        }
        self.storage.delete(&key)
    }
}
