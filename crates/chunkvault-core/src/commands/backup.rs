use chrono::Utc;
use tracing::info;

use chunkvault_types::error::Result;
use chunkvault_types::{BackupId, ChunkHash};

use crate::backup::{BackupMetadata, ChunkRef, DeduplicatedBackup};
use crate::chunker;
use crate::index::IndexDelta;
use crate::vault::Vault;

/// Create a deduplicated backup from an in-memory source stream.
///
/// Chunk payloads are written before any index mutation, and the index write
/// is the final step. A failure part-way therefore leaves at most orphaned
/// chunk files on disk and never a dangling backup record; re-running the
/// same content reuses those files because payload writes are idempotent.
pub fn run(vault: &mut Vault, source: &[u8], source_path: &str) -> Result<DeduplicatedBackup> {
    let checksum = ChunkHash::compute(source);
    let ranges = chunker::chunk_data(source, &vault.config.chunker);

    let mut delta = IndexDelta::new();
    let mut chunk_refs: Vec<ChunkRef> = Vec::with_capacity(ranges.len());
    let mut deduplicated_size: u64 = 0;

    for (offset, length) in ranges {
        let data = &source[offset..offset + length];
        let hash = ChunkHash::compute(data);

        if vault.index().contains(&hash) || delta.contains_new(&hash) {
            // Dedup hit against a committed chunk or one staged earlier in
            // this same stream: no physical write.
            delta.bump_ref(&hash);
        } else {
            vault.store().put(&hash, data)?;
            delta.add_new(hash, length as u32, offset as u64);
            deduplicated_size += length as u64;
        }

        chunk_refs.push(ChunkRef {
            hash,
            size: length as u32,
            offset: offset as u64,
        });
    }

    let original_size = source.len() as u64;
    let compression_ratio = if deduplicated_size > 0 {
        original_size as f64 / deduplicated_size as f64
    } else {
        1.0
    };

    let backup = DeduplicatedBackup {
        id: BackupId::generate(),
        original_path: source_path.to_string(),
        metadata: BackupMetadata {
            original_size,
            deduplicated_size,
            compression_ratio,
            chunk_count: chunk_refs.len() as u64,
            timestamp: Utc::now(),
            checksum,
        },
        chunks: chunk_refs,
    };

    // All payload writes succeeded: apply the staged mutations, record the
    // backup, and persist the full index.
    let new_chunks = delta.new_len();
    delta.apply_to(vault.index_mut(), Utc::now());
    vault.index_mut().insert_backup(backup.clone());
    vault.save_index()?;

    info!(
        backup = %backup.id,
        source = %source_path,
        chunks = backup.metadata.chunk_count,
        new_chunks,
        original_size,
        deduplicated_size,
        "created backup"
    );
    Ok(backup)
}
