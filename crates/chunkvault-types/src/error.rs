use thiserror::Error;

use crate::{BackupId, ChunkHash};

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("cannot read backup source '{path}': {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata index is corrupt: {0}")]
    IndexCorrupt(String),

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("chunk not found in store: {0}")]
    ChunkNotFound(ChunkHash),

    #[error("chunk {hash} is corrupt: {reason}")]
    ChunkCorrupt { hash: ChunkHash, reason: String },

    #[error("backup not found: '{0}'")]
    BackupNotFound(BackupId),

    #[error("integrity check failed for backup '{backup}': {reason}")]
    IntegrityCheckFailed { backup: BackupId, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("decompression error: {0}")]
    Decompression(String),

    #[error("unknown compression tag: {0}")]
    UnknownCompressionTag(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
