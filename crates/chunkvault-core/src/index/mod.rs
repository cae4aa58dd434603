use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chunkvault_types::{BackupId, ChunkHash};

use crate::backup::DeduplicatedBackup;

pub const INDEX_VERSION: u32 = 1;

/// Record for one physically stored, unique chunk.
/// The content hash is the map key in [`MetadataIndex`] and is not duplicated
/// inside the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Original (pre-compression) byte length.
    pub size: u32,
    /// Byte offset within the first backup that introduced this chunk.
    /// Informational only; reconstruction order comes from each backup's
    /// chunk list.
    pub offset: u64,
    /// Number of live backup references. Zero marks an orphan awaiting
    /// physical removal.
    pub ref_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

/// Aggregate store statistics, recomputed on every index save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_backups: u64,
    /// Chunk references across all backups (one backup may reference the
    /// same chunk more than once).
    pub total_chunks: u64,
    pub unique_chunks: u64,
    pub total_original_size: u64,
    /// Unique chunk bytes actually stored (pre-compression).
    pub total_storage_size: u64,
    pub space_saved: u64,
    /// Fraction of original bytes avoided by reusing stored chunks.
    pub deduplication_ratio: f64,
    pub average_chunk_size: u64,
}

/// Durable mapping of chunk-hash -> chunk record and backup-id -> backup
/// record: the single source of truth for the engine.
///
/// Held in memory for the vault's lifetime and rewritten in full on every
/// mutating operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataIndex {
    pub version: u32,
    pub last_updated: DateTime<Utc>,
    chunks: HashMap<ChunkHash, ChunkRecord>,
    backups: HashMap<BackupId, DeduplicatedBackup>,
    stats: StoreStats,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            last_updated: Utc::now(),
            chunks: HashMap::new(),
            backups: HashMap::new(),
            stats: StoreStats::default(),
        }
    }

    // ----- Chunk records -----

    pub fn contains(&self, hash: &ChunkHash) -> bool {
        self.chunks.contains_key(hash)
    }

    pub fn chunk(&self, hash: &ChunkHash) -> Option<&ChunkRecord> {
        self.chunks.get(hash)
    }

    pub fn insert_chunk(&mut self, hash: ChunkHash, record: ChunkRecord) {
        self.chunks.insert(hash, record);
    }

    /// Increment the reference count of an existing chunk.
    pub fn increment_ref(&mut self, hash: &ChunkHash) {
        if let Some(record) = self.chunks.get_mut(hash) {
            record.ref_count += 1;
        }
    }

    /// Update a chunk's last-accessed time.
    pub fn touch(&mut self, hash: &ChunkHash, now: DateTime<Utc>) {
        if let Some(record) = self.chunks.get_mut(hash) {
            record.last_accessed = now;
        }
    }

    /// Decrement a chunk's reference count. Returns the new count and the
    /// chunk's size, or `None` if the chunk is unknown.
    ///
    /// A record that reaches zero stays in the index as an orphan so the
    /// cleanup pass can find it if its physical removal is deferred or fails.
    pub fn decrement(&mut self, hash: &ChunkHash) -> Option<(u32, u32)> {
        let record = self.chunks.get_mut(hash)?;
        record.ref_count = record.ref_count.saturating_sub(1);
        Some((record.ref_count, record.size))
    }

    pub fn remove_chunk(&mut self, hash: &ChunkHash) -> Option<ChunkRecord> {
        self.chunks.remove(hash)
    }

    /// All chunks with a zero reference count, as `(hash, size)` pairs.
    pub fn orphans(&self) -> Vec<(ChunkHash, u32)> {
        self.chunks
            .iter()
            .filter(|(_, record)| record.ref_count == 0)
            .map(|(hash, record)| (*hash, record.size))
            .collect()
    }

    pub fn chunk_iter(&self) -> impl Iterator<Item = (&ChunkHash, &ChunkRecord)> {
        self.chunks.iter()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    // ----- Backup records -----

    pub fn insert_backup(&mut self, backup: DeduplicatedBackup) {
        self.backups.insert(backup.id, backup);
    }

    pub fn get_backup(&self, id: &BackupId) -> Option<&DeduplicatedBackup> {
        self.backups.get(id)
    }

    pub fn remove_backup(&mut self, id: &BackupId) -> Option<DeduplicatedBackup> {
        self.backups.remove(id)
    }

    pub fn backup_iter(&self) -> impl Iterator<Item = &DeduplicatedBackup> {
        self.backups.values()
    }

    pub fn backup_count(&self) -> usize {
        self.backups.len()
    }

    // ----- Stats -----

    /// The stats block as of the last save.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Derive fresh statistics from the current chunk and backup maps.
    pub fn compute_stats(&self) -> StoreStats {
        let total_backups = self.backups.len() as u64;
        let total_chunks: u64 = self
            .backups
            .values()
            .map(|b| b.metadata.chunk_count)
            .sum();
        let unique_chunks = self.chunks.len() as u64;
        let total_original_size: u64 = self
            .backups
            .values()
            .map(|b| b.metadata.original_size)
            .sum();
        let total_storage_size: u64 = self.chunks.values().map(|r| r.size as u64).sum();
        let space_saved = total_original_size.saturating_sub(total_storage_size);
        let deduplication_ratio = if total_original_size > 0 {
            space_saved as f64 / total_original_size as f64
        } else {
            0.0
        };
        let average_chunk_size = if unique_chunks > 0 {
            total_storage_size / unique_chunks
        } else {
            0
        };

        StoreStats {
            total_backups,
            total_chunks,
            unique_chunks,
            total_original_size,
            total_storage_size,
            space_saved,
            deduplication_ratio,
            average_chunk_size,
        }
    }

    /// Refresh the derived fields prior to persisting.
    pub fn refresh(&mut self) {
        self.last_updated = Utc::now();
        self.stats = self.compute_stats();
    }
}

impl Default for MetadataIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Staged index mutations accumulated while a backup's chunk payloads are
/// being written. Applied to the index only after every payload write has
/// succeeded, so a failed write leaves the index untouched.
#[derive(Debug, Default)]
pub struct IndexDelta {
    /// Chunks first stored during this operation: hash -> (size, offset).
    new_entries: HashMap<ChunkHash, (u32, u64)>,
    /// Additional references beyond the first, for both pre-existing chunks
    /// and chunks staged in `new_entries`.
    ref_bumps: HashMap<ChunkHash, u32>,
}

impl IndexDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.new_entries.is_empty() && self.ref_bumps.is_empty()
    }

    /// Number of chunks staged as newly stored.
    pub fn new_len(&self) -> usize {
        self.new_entries.len()
    }

    /// Whether `hash` was staged as a new chunk by this operation.
    pub fn contains_new(&self, hash: &ChunkHash) -> bool {
        self.new_entries.contains_key(hash)
    }

    /// Stage a newly stored chunk with an implicit first reference.
    pub fn add_new(&mut self, hash: ChunkHash, size: u32, offset: u64) {
        self.new_entries.insert(hash, (size, offset));
    }

    /// Record one additional reference to a chunk.
    pub fn bump_ref(&mut self, hash: &ChunkHash) {
        *self.ref_bumps.entry(*hash).or_insert(0) += 1;
    }

    /// Apply the staged mutations: insert new records, then apply reference
    /// bumps and access-time touches to both new and pre-existing chunks.
    pub fn apply_to(self, index: &mut MetadataIndex, now: DateTime<Utc>) {
        for (hash, (size, offset)) in self.new_entries {
            index.insert_chunk(
                hash,
                ChunkRecord {
                    size,
                    offset,
                    ref_count: 1,
                    created_at: now,
                    last_accessed: now,
                },
            );
        }
        for (hash, count) in self.ref_bumps {
            for _ in 0..count {
                index.increment_ref(&hash);
            }
            index.touch(&hash, now);
        }
    }
}
