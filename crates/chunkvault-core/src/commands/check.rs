use tracing::debug;

use chunkvault_types::error::Result;
use chunkvault_types::ChunkHash;

use crate::vault::Vault;

/// Summary of an integrity verification pass.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub verified_chunks: u64,
    pub corrupted: Vec<ChunkHash>,
}

/// Verify every indexed chunk: load its payload, recompute the hash, and
/// compare both the hash and the recorded size. Chunks that cannot be loaded
/// at all count as corrupted; the scan continues past them.
///
/// Read-only: never mutates the index or the store.
pub fn run(vault: &Vault) -> Result<IntegrityReport> {
    let mut report = IntegrityReport::default();

    for (hash, record) in vault.index().chunk_iter() {
        let payload = match vault.store().get(hash) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(chunk = %hash, error = %e, "chunk failed to load during verification");
                report.corrupted.push(*hash);
                continue;
            }
        };

        if payload.len() as u32 != record.size {
            debug!(
                chunk = %hash,
                expected = record.size,
                actual = payload.len(),
                "chunk size mismatch"
            );
            report.corrupted.push(*hash);
            continue;
        }

        if ChunkHash::compute(&payload) != *hash {
            debug!(chunk = %hash, "chunk hash mismatch");
            report.corrupted.push(*hash);
            continue;
        }

        report.verified_chunks += 1;
    }

    Ok(report)
}
