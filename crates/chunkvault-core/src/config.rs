use serde::{Deserialize, Serialize};

use chunkvault_types::error::{Result, VaultError};

/// Default chunk size: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Hard upper limit on the configured chunk size (16 MiB).
/// Keeps decompression buffers bounded; see `compress::MAX_DECOMPRESS_SIZE`.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_zstd_level() -> i32 {
    3
}

/// Parameters for the fixed-size chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    None,
    #[default]
    Lz4,
    Zstd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default)]
    pub algorithm: CompressionAlgorithm,
    #[serde(default = "default_zstd_level")]
    pub zstd_level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            algorithm: CompressionAlgorithm::default(),
            zstd_level: default_zstd_level(),
        }
    }
}

/// Engine configuration with named, typed fields and documented defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub chunker: ChunkerConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
}

impl VaultConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunker.chunk_size == 0 {
            return Err(VaultError::Config("chunk_size must be non-zero".into()));
        }
        if self.chunker.chunk_size > MAX_CHUNK_SIZE {
            return Err(VaultError::Config(format!(
                "chunk_size ({}) exceeds hard limit of {} bytes",
                self.chunker.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        if !(1..=22).contains(&self.compression.zstd_level) {
            return Err(VaultError::Config(format!(
                "zstd_level must be in 1..=22, got {}",
                self.compression.zstd_level
            )));
        }
        Ok(())
    }
}
