use crate::config::ChunkerConfig;

/// Split a byte slice into fixed-size blocks.
/// Returns a vector of `(offset, length)` pairs in stream order. Every block
/// is exactly `chunk_size` bytes except the final one, which holds the
/// remainder. Zero-length input yields an empty vector.
///
/// Block boundaries depend only on `(chunk_size, data.len())`, so identical
/// content at aligned positions always produces identical blocks.
pub fn chunk_data(data: &[u8], config: &ChunkerConfig) -> Vec<(usize, usize)> {
    let chunk_size = config.chunk_size;
    assert!(chunk_size > 0, "chunk_size must be non-zero");

    let mut ranges = Vec::with_capacity(data.len().div_ceil(chunk_size));
    let mut offset = 0;
    while offset < data.len() {
        let length = chunk_size.min(data.len() - offset);
        ranges.push((offset, length));
        offset += length;
    }
    ranges
}
