use chunk_store::{hash_chunk_data, Chunk, Key};

use crate::errors::{HarnessError, HarnessResult};

/// Content-integrity check for a chunk fetched under `key`.
///
/// The retrieved chunk must carry the requested key, and that key must be
/// the hash of the chunk data: span header as the length seed, then the body.
pub fn verify_chunk(key: &Key, chunk: &Chunk) -> HarnessResult<()> {
    if key != chunk.key() {
        return Err(HarnessError::KeyMismatch {
            requested: *key,
            found: *chunk.key(),
        });
    }

    let expected = hash_chunk_data(chunk.data())?;

    if expected != *key {
        return Err(HarnessError::HashMismatch {
            key: *key,
            expected,
        });
    }
    Ok(())
}
