use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ChunkResult, ChunkStoreError};
use crate::hash::derive_key;
use crate::signal::StoredSignal;

/// Digest length of the default hasher, and so the width of every key.
pub const KEY_LENGTH: usize = 32;

/// Size of the little-endian length header at the front of chunk data.
pub const SPAN_SIZE: usize = 8;

/// Content address of a chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key([u8; KEY_LENGTH]);

impl Key {
    pub fn new(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> ChunkResult<Self> {
        let bytes: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            ChunkStoreError::Malformed(format!(
                "key must be {} bytes, got {}",
                KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.hex())
    }
}

/// An immutable unit of content and the key it is stored under.
///
/// `data` is laid out as an 8 byte little-endian span (the body length)
/// followed by the body. The key is the hash of that layout; stores keep
/// the chunk itself and resolve its `StoredSignal` once the write is durable.
#[derive(Debug)]
pub struct Chunk {
    key: Key,
    data: Vec<u8>,
    stored: StoredSignal,
}

impl Chunk {
    /// Builds a chunk from data that was hashed elsewhere.
    pub fn new(key: Key, data: Vec<u8>) -> Self {
        Self {
            key,
            data,
            stored: StoredSignal::new(),
        }
    }

    /// Builds a chunk from a body, prefixing the span header and deriving the key.
    pub fn from_body(body: &[u8]) -> Self {
        let mut data = vec![0u8; SPAN_SIZE + body.len()];
        LittleEndian::write_u64(&mut data[..SPAN_SIZE], body.len() as u64);
        data[SPAN_SIZE..].copy_from_slice(body);
        let key = derive_key(&data[..SPAN_SIZE], body);
        Self::new(key, data)
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Declared body length from the span header, if the data carries one.
    pub fn span(&self) -> Option<u64> {
        if self.data.len() < SPAN_SIZE {
            return None;
        }
        Some(LittleEndian::read_u64(&self.data[..SPAN_SIZE]))
    }

    pub fn body(&self) -> &[u8] {
        self.data.get(SPAN_SIZE..).unwrap_or_default()
    }

    pub fn stored(&self) -> &StoredSignal {
        &self.stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_chunk_data;

    #[test]
    fn test_from_body_layout() {
        let chunk = Chunk::from_body(b"hello world");
        assert_eq!(chunk.span(), Some(11));
        assert_eq!(chunk.body(), b"hello world");
        assert_eq!(chunk.data().len(), SPAN_SIZE + 11);
        assert_eq!(*chunk.key(), hash_chunk_data(chunk.data()).unwrap());
        assert!(!chunk.stored().is_resolved());
    }

    #[test]
    fn test_distinct_bodies_distinct_keys() {
        let a = Chunk::from_body(b"chunk a");
        let b = Chunk::from_body(b"chunk b");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_key_hex_roundtrip() {
        let chunk = Chunk::from_body(b"abc");
        let hex = chunk.key().hex();
        assert_eq!(hex.len(), KEY_LENGTH * 2);
        let decoded = hex::decode(&hex).unwrap();
        assert_eq!(Key::from_slice(&decoded).unwrap(), *chunk.key());
    }

    #[test]
    fn test_key_from_short_slice() {
        let err = Key::from_slice(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, ChunkStoreError::Malformed(_)));
    }

    #[test]
    fn test_short_data_has_no_span() {
        let chunk = Chunk::new(Key::new([0u8; KEY_LENGTH]), vec![1, 2]);
        assert_eq!(chunk.span(), None);
        assert!(chunk.body().is_empty());
    }
}
