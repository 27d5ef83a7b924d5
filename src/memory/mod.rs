pub mod embeddings;
pub mod forget;
pub mod lifecycle;
pub mod relations;
pub mod search;
pub mod stats;
pub mod store;
pub mod types;

/// Encode a vector as a little-endian f32 blob (the cache and vec0 wire format).
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decode a little-endian f32 blob. Trailing bytes that do not form a full float are ignored.
pub fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
