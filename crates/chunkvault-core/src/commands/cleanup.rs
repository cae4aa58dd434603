use tracing::{info, warn};

use chunkvault_types::error::Result;

use crate::vault::Vault;

#[derive(Debug, Default)]
pub struct CleanupStats {
    pub cleaned_chunks: u64,
    pub space_freed: u64,
}

/// Reclaim orphaned chunks: records whose reference count is zero.
///
/// For each orphan the physical payload is removed first (idempotently), then
/// the record is dropped from the index. After a pass with no removal
/// failures, every indexed chunk has a positive reference count and a
/// retrievable payload.
pub fn run(vault: &mut Vault) -> Result<CleanupStats> {
    let orphans = vault.index().orphans();
    let mut stats = CleanupStats::default();

    for (hash, size) in orphans {
        match vault.store().remove(&hash) {
            Ok(()) => {
                vault.index_mut().remove_chunk(&hash);
                stats.cleaned_chunks += 1;
                stats.space_freed += size as u64;
            }
            Err(e) => {
                warn!(
                    chunk = %hash,
                    error = %e,
                    "failed to remove orphan payload, keeping record for a later pass"
                );
            }
        }
    }
    vault.save_index()?;

    if stats.cleaned_chunks > 0 {
        info!(
            cleaned_chunks = stats.cleaned_chunks,
            space_freed = stats.space_freed,
            "cleaned up orphan chunks"
        );
    }
    Ok(stats)
}
