use std::path::Path;

use chrono::Utc;
use tracing::info;

use chunkvault_types::error::{Result, VaultError};
use chunkvault_types::{BackupId, ChunkHash};

use crate::vault::Vault;

#[derive(Debug)]
pub struct RestoreStats {
    pub bytes_written: u64,
    pub chunks_read: u64,
}

/// Reassemble a backup's content in memory and validate it.
///
/// Chunks are concatenated in list order, then the whole-file hash and total
/// length are checked against the backup's metadata. Touches each referenced
/// chunk's `last_accessed`; never changes reference counts. The caller is
/// responsible for persisting the access-time update via `save_index`.
pub fn reassemble(vault: &mut Vault, id: &BackupId) -> Result<Vec<u8>> {
    let backup = vault
        .index()
        .get_backup(id)
        .cloned()
        .ok_or(VaultError::BackupNotFound(*id))?;

    let mut content = Vec::with_capacity(backup.metadata.original_size as usize);
    for chunk_ref in &backup.chunks {
        let data = vault
            .store()
            .get(&chunk_ref.hash)
            .map_err(|e| VaultError::IntegrityCheckFailed {
                backup: *id,
                reason: e.to_string(),
            })?;
        content.extend_from_slice(&data);
    }

    if content.len() as u64 != backup.metadata.original_size {
        return Err(VaultError::IntegrityCheckFailed {
            backup: *id,
            reason: format!(
                "reassembled length {} does not match original size {}",
                content.len(),
                backup.metadata.original_size
            ),
        });
    }

    let recomputed = ChunkHash::compute(&content);
    if recomputed != backup.metadata.checksum {
        return Err(VaultError::IntegrityCheckFailed {
            backup: *id,
            reason: format!(
                "checksum mismatch: expected {}, recomputed {}",
                backup.metadata.checksum, recomputed
            ),
        });
    }

    let now = Utc::now();
    for chunk_ref in &backup.chunks {
        vault.index_mut().touch(&chunk_ref.hash, now);
    }

    Ok(content)
}

/// Restore a backup to a destination path.
///
/// The destination is written only after the reassembled content has passed
/// checksum and length validation; a failed validation leaves it untouched.
/// Updated access times are persisted before returning.
pub fn run(vault: &mut Vault, id: &BackupId, destination: &Path) -> Result<RestoreStats> {
    let chunks_read = vault
        .index()
        .get_backup(id)
        .map(|b| b.chunks.len() as u64)
        .ok_or(VaultError::BackupNotFound(*id))?;

    let content = reassemble(vault, id)?;

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(destination, &content)?;

    vault.save_index()?;

    info!(
        backup = %id,
        bytes = content.len(),
        destination = %destination.display(),
        "restored backup"
    );
    Ok(RestoreStats {
        bytes_written: content.len() as u64,
        chunks_read,
    })
}
