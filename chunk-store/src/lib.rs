//! Content-addressed chunk storage.
//!
//! A [`Chunk`] carries a payload and the [`Key`] derived from it. Any
//! backend implementing [`ChunkStore`] accepts chunks with `put`, serves
//! them with `get`, and signals durability through the chunk's
//! [`StoredSignal`].

pub mod buffered_store;
pub mod chunk;
pub mod error;
pub mod hash;
pub mod map_store;
pub mod signal;
pub mod store;

pub use buffered_store::BufferedChunkStore;
pub use chunk::{Chunk, Key, KEY_LENGTH, SPAN_SIZE};
pub use error::{ChunkResult, ChunkStoreError};
pub use hash::{default_hasher, hash_chunk_data, ChunkHasher, Sha256ChunkHasher};
pub use map_store::MapChunkStore;
pub use signal::StoredSignal;
pub use store::{ChunkStore, GetConfirm, PutConfirm};
