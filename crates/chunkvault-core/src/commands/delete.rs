use tracing::{info, warn};

use chunkvault_types::error::{Result, VaultError};
use chunkvault_types::{BackupId, ChunkHash};

use crate::vault::Vault;

#[derive(Debug)]
pub struct DeleteStats {
    pub backup_id: BackupId,
    pub chunks_deleted: u64,
    pub space_freed: u64,
}

/// Delete a backup and reclaim chunks whose reference count reaches zero.
///
/// The index (minus the backup record, with decremented refcounts) is
/// persisted before any physical payload is removed. A crash or a failed
/// removal therefore leaves zero-ref orphan records behind, which
/// `cleanup::run` reclaims on a later pass; it never leaves a chunk record
/// pointing at a payload another backup still needs.
pub fn run(vault: &mut Vault, id: &BackupId) -> Result<DeleteStats> {
    let backup = vault
        .index_mut()
        .remove_backup(id)
        .ok_or(VaultError::BackupNotFound(*id))?;

    let mut doomed: Vec<(ChunkHash, u32)> = Vec::new();
    for chunk_ref in &backup.chunks {
        if let Some((ref_count, size)) = vault.index_mut().decrement(&chunk_ref.hash) {
            if ref_count == 0 {
                doomed.push((chunk_ref.hash, size));
            }
        }
    }
    vault.save_index()?;

    let mut stats = DeleteStats {
        backup_id: *id,
        chunks_deleted: 0,
        space_freed: 0,
    };
    for (hash, size) in doomed {
        match vault.store().remove(&hash) {
            Ok(()) => {
                vault.index_mut().remove_chunk(&hash);
                stats.chunks_deleted += 1;
                stats.space_freed += size as u64;
            }
            Err(e) => {
                warn!(
                    chunk = %hash,
                    error = %e,
                    "failed to remove chunk payload, leaving orphan record for cleanup"
                );
            }
        }
    }
    vault.save_index()?;

    info!(
        backup = %id,
        chunks_deleted = stats.chunks_deleted,
        space_freed = stats.space_freed,
        "deleted backup"
    );
    Ok(stats)
}
