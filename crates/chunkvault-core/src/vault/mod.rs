use std::sync::Arc;

use tracing::debug;

use chunkvault_types::error::{Result, VaultError};

use crate::compress::Compression;
use crate::config::VaultConfig;
use crate::index::{MetadataIndex, INDEX_VERSION};
use crate::storage::StorageBackend;
use crate::store::ChunkStore;

/// Storage key of the persisted metadata index document.
const INDEX_KEY: &str = "index";

/// A handle to an opened vault: storage backend, chunk store and metadata
/// index bound together under one configuration.
pub struct Vault {
    pub storage: Arc<dyn StorageBackend>,
    store: ChunkStore,
    index: MetadataIndex,
    index_dirty: bool,
    pub config: VaultConfig,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("index_dirty", &self.index_dirty)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Open a vault over the given backend. A missing persisted index means
    /// an empty store, not an error.
    pub fn open(storage: Arc<dyn StorageBackend>, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        let index = Self::load_index(storage.as_ref())?;
        let compression =
            Compression::from_algorithm(config.compression.algorithm, config.compression.zstd_level);
        let store = ChunkStore::new(Arc::clone(&storage), compression);
        debug!(
            chunks = index.chunk_count(),
            backups = index.backup_count(),
            "opened vault"
        );
        Ok(Self {
            storage,
            store,
            index,
            index_dirty: false,
            config,
        })
    }

    fn load_index(storage: &dyn StorageBackend) -> Result<MetadataIndex> {
        match storage.get(INDEX_KEY)? {
            None => Ok(MetadataIndex::new()),
            Some(raw) => {
                let index: MetadataIndex = rmp_serde::from_slice(&raw)
                    .map_err(|e| VaultError::IndexCorrupt(e.to_string()))?;
                if index.version != INDEX_VERSION {
                    return Err(VaultError::UnsupportedVersion(index.version));
                }
                Ok(index)
            }
        }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Read-only access to the metadata index.
    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Mutable access to the metadata index. Marks it dirty.
    pub fn index_mut(&mut self) -> &mut MetadataIndex {
        self.index_dirty = true;
        &mut self.index
    }

    /// Persist the index if it has been mutated since the last save.
    ///
    /// Refreshes `last_updated` and the derived stats block, then writes the
    /// full document through the backend's atomic put. This is always the
    /// final step of a mutating operation.
    pub fn save_index(&mut self) -> Result<()> {
        if !self.index_dirty {
            return Ok(());
        }
        self.index.refresh();
        let raw = rmp_serde::to_vec(&self.index)?;
        self.storage.put(INDEX_KEY, &raw)?;
        self.index_dirty = false;
        Ok(())
    }
}
