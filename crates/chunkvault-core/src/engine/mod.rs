use std::path::Path;
use std::sync::{Arc, Mutex};

use chunkvault_types::error::{Result, VaultError};
use chunkvault_types::BackupId;

use crate::backup::DeduplicatedBackup;
use crate::commands::{backup, check, cleanup, delete, info, restore};
use crate::commands::check::IntegrityReport;
use crate::commands::cleanup::CleanupStats;
use crate::commands::delete::DeleteStats;
use crate::commands::restore::RestoreStats;
use crate::config::VaultConfig;
use crate::index::StoreStats;
use crate::storage::local_backend::LocalBackend;
use crate::storage::StorageBackend;
use crate::vault::Vault;

struct EngineState {
    vault: Option<Vault>,
    storage: Arc<dyn StorageBackend>,
    config: VaultConfig,
}

/// The shared deduplication service.
///
/// Every operation runs as a non-overlapping critical section behind an
/// internal mutex: each mutating operation reads the whole index, mutates it
/// in memory and rewrites it in full, so unguarded concurrent mutation would
/// lose updates. Construct one engine per process and inject it into
/// collaborators.
///
/// Concurrent access to the same on-disk store from multiple processes is
/// NOT guarded here; external advisory locking is a prerequisite for sharing
/// a store across processes.
pub struct DedupEngine {
    state: Mutex<EngineState>,
}

impl DedupEngine {
    /// Create an engine over an arbitrary storage backend.
    ///
    /// The metadata index is loaded lazily on the first operation; a missing
    /// persisted index means an empty store.
    pub fn new(storage: Box<dyn StorageBackend>, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(EngineState {
                vault: None,
                storage: Arc::from(storage),
                config,
            }),
        })
    }

    /// Convenience constructor for a local filesystem store rooted at `root`.
    pub fn open_local(root: &Path, config: VaultConfig) -> Result<Self> {
        let storage = Box::new(LocalBackend::new(root)?);
        Self::new(storage, config)
    }

    /// Run an operation against the vault, opening it on first use.
    fn with_vault<T>(&self, f: impl FnOnce(&mut Vault) -> Result<T>) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| VaultError::Other("engine lock poisoned by a previous panic".into()))?;
        if state.vault.is_none() {
            let vault = Vault::open(Arc::clone(&state.storage), state.config.clone())?;
            state.vault = Some(vault);
        }
        match state.vault.as_mut() {
            Some(vault) => f(vault),
            None => Err(VaultError::Other("vault failed to open".into())),
        }
    }

    /// Create a deduplicated backup from an in-memory source stream.
    pub fn create_backup(&self, source: &[u8], source_path: &str) -> Result<DeduplicatedBackup> {
        self.with_vault(|vault| backup::run(vault, source, source_path))
    }

    /// Create a backup from a file on disk, using its path as the label.
    pub fn backup_file(&self, path: &Path) -> Result<DeduplicatedBackup> {
        let source = std::fs::read(path).map_err(|e| VaultError::SourceRead {
            path: path.display().to_string(),
            source: e,
        })?;
        self.create_backup(&source, &path.display().to_string())
    }

    /// Restore a backup to a destination path, verifying integrity first.
    pub fn restore_backup(&self, id: &BackupId, destination: &Path) -> Result<RestoreStats> {
        self.with_vault(|vault| restore::run(vault, id, destination))
    }

    /// Restore a backup's verified content into memory.
    pub fn restore_backup_bytes(&self, id: &BackupId) -> Result<Vec<u8>> {
        self.with_vault(|vault| {
            let content = restore::reassemble(vault, id)?;
            vault.save_index()?;
            Ok(content)
        })
    }

    /// Delete a backup, reclaiming chunks no other backup references.
    pub fn delete_backup(&self, id: &BackupId) -> Result<DeleteStats> {
        self.with_vault(|vault| delete::run(vault, id))
    }

    /// List all backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<DeduplicatedBackup>> {
        self.with_vault(|vault| Ok(info::list_backups(vault)))
    }

    /// Fetch a single backup record.
    pub fn get_backup_info(&self, id: &BackupId) -> Result<DeduplicatedBackup> {
        self.with_vault(|vault| info::backup_info(vault, id))
    }

    /// Current store-wide statistics, derived from the live index.
    pub fn calculate_stats(&self) -> Result<StoreStats> {
        self.with_vault(|vault| Ok(info::calculate_stats(vault)))
    }

    /// Remove orphaned chunks left behind by failed or interrupted deletes.
    pub fn cleanup_orphans(&self) -> Result<CleanupStats> {
        self.with_vault(cleanup::run)
    }

    /// Recompute the hash of every stored chunk and report mismatches.
    pub fn verify_integrity(&self) -> Result<IntegrityReport> {
        self.with_vault(|vault| check::run(vault))
    }
}
