//! BLAKE3 helpers shared by the embedding cache and the hashed embedder.

/// Full 32-byte BLAKE3 digest of `text`, used as a cache key.
#[inline]
pub fn hash_text(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// First 8 bytes of the BLAKE3 digest as a little-endian `u64`.
///
/// Collisions only cost accuracy (two tokens sharing a bucket), never correctness.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
