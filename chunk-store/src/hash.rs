use sha2::{Digest, Sha256};

use crate::chunk::{Key, KEY_LENGTH, SPAN_SIZE};
use crate::error::{ChunkResult, ChunkStoreError};

/// A length-aware hasher producing a fixed-size chunk key.
///
/// The span header (the declared payload length) is fed in through
/// `reset_with_length` before the body, so two bodies with equal bytes but
/// different declared lengths never share a key.
pub trait ChunkHasher: Send {
    /// Starts a fresh digest seeded with the span header.
    fn reset_with_length(&mut self, span: &[u8]);

    /// Feeds body bytes into the digest.
    fn update(&mut self, data: &[u8]);

    /// Consumes the hasher and returns the digest as a key.
    fn finalize_key(self: Box<Self>) -> Key;
}

/// SHA-256 chunk hasher, the default key derivation.
#[derive(Default)]
pub struct Sha256ChunkHasher {
    inner: Sha256,
}

impl ChunkHasher for Sha256ChunkHasher {
    fn reset_with_length(&mut self, span: &[u8]) {
        self.inner = Sha256::new();
        Digest::update(&mut self.inner, span);
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize_key(self: Box<Self>) -> Key {
        let digest = self.inner.finalize();
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&digest);
        Key::new(key)
    }
}

pub fn default_hasher() -> Box<dyn ChunkHasher> {
    Box::<Sha256ChunkHasher>::default()
}

/// Derives the key for raw chunk data laid out as span header followed by body.
pub fn hash_chunk_data(data: &[u8]) -> ChunkResult<Key> {
    if data.len() < SPAN_SIZE {
        return Err(ChunkStoreError::Malformed(format!(
            "chunk data is {} bytes, shorter than the {} byte span header",
            data.len(),
            SPAN_SIZE
        )));
    }
    let (span, body) = data.split_at(SPAN_SIZE);
    Ok(derive_key(span, body))
}

/// The one key derivation: the span header seeds the digest, then the body.
pub(crate) fn derive_key(span: &[u8], body: &[u8]) -> Key {
    let mut hasher = default_hasher();
    hasher.reset_with_length(span);
    hasher.update(body);
    hasher.finalize_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let data = [8u8, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(hash_chunk_data(&data).unwrap(), hash_chunk_data(&data).unwrap());
    }

    #[test]
    fn test_span_changes_key() {
        let a = [3u8, 0, 0, 0, 0, 0, 0, 0, 9, 9, 9];
        let b = [4u8, 0, 0, 0, 0, 0, 0, 0, 9, 9, 9];
        assert_ne!(hash_chunk_data(&a).unwrap(), hash_chunk_data(&b).unwrap());
    }

    #[test]
    fn test_short_data_is_malformed() {
        let err = hash_chunk_data(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ChunkStoreError::Malformed(_)));
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = [5u8, 0, 0, 0, 0, 0, 0, 0, b'h', b'e', b'l', b'l', b'o'];
        let mut hasher = default_hasher();
        hasher.reset_with_length(&data[..SPAN_SIZE]);
        hasher.update(b"he");
        hasher.update(b"llo");
        assert_eq!(hasher.finalize_key(), hash_chunk_data(&data).unwrap());
    }
}
