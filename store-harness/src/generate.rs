use chunk_store::Chunk;
use rand::RngCore;

/// Fills a buffer of `len` bytes from the thread-local CSPRNG.
pub fn generate_random_data(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill_bytes(&mut data);
    data
}

/// A chunk whose body is `body_size` random bytes.
pub fn generate_random_chunk(body_size: usize) -> Chunk {
    Chunk::from_body(&generate_random_data(body_size))
}
