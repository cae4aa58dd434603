use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chunkvault_types::{BackupId, ChunkHash};

/// Reference to one chunk within a backup's reconstruction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    pub hash: ChunkHash,
    /// Original (pre-compression) byte length of this chunk.
    pub size: u32,
    /// Byte offset of this chunk within the source stream.
    pub offset: u64,
}

/// One deduplicated snapshot of a source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeduplicatedBackup {
    pub id: BackupId,
    /// Source path at capture time. Informational.
    pub original_path: String,
    /// Ordered chunk references; list order defines reconstruction order.
    pub chunks: Vec<ChunkRef>,
    pub metadata: BackupMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub original_size: u64,
    /// Bytes newly stored while creating this backup (cost attribution),
    /// not total referenced bytes.
    pub deduplicated_size: u64,
    /// `original_size / deduplicated_size`, or 1.0 when nothing new was stored.
    pub compression_ratio: f64,
    pub chunk_count: u64,
    pub timestamp: DateTime<Utc>,
    /// Whole-file content hash computed before chunking; validated on restore.
    pub checksum: ChunkHash,
}
