use chunkvault_types::error::{Result, VaultError};
use chunkvault_types::BackupId;

use crate::backup::DeduplicatedBackup;
use crate::index::StoreStats;
use crate::vault::Vault;

/// List all backups, newest first (stable tie-break on id).
pub fn list_backups(vault: &Vault) -> Vec<DeduplicatedBackup> {
    let mut backups: Vec<DeduplicatedBackup> = vault.index().backup_iter().cloned().collect();
    backups.sort_by(|a, b| {
        b.metadata
            .timestamp
            .cmp(&a.metadata.timestamp)
            .then_with(|| a.id.0.cmp(&b.id.0))
    });
    backups
}

/// Look up a single backup record.
pub fn backup_info(vault: &Vault, id: &BackupId) -> Result<DeduplicatedBackup> {
    vault
        .index()
        .get_backup(id)
        .cloned()
        .ok_or(VaultError::BackupNotFound(*id))
}

/// Derive current store-wide statistics from the live index.
pub fn calculate_stats(vault: &Vault) -> StoreStats {
    vault.index().compute_stats()
}
