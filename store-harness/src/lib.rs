//! Concurrent bulk write/read harness for `ChunkStore` implementations.
//!
//! [`mput`] fans generated chunks out over a worker pool and waits for each
//! to become durable; [`mget`] reads a key set back concurrently under a
//! fixed timeout, optionally verifying every chunk against its key.

pub mod errors;
pub mod generate;
pub mod mget;
pub mod mput;
pub mod params;
pub mod scenario;
pub mod telemetry;
pub mod verify;

use std::sync::Arc;

use chunk_store::{BufferedChunkStore, ChunkStore, MapChunkStore};

pub use errors::{HarnessError, HarnessResult};
pub use generate::{generate_random_chunk, generate_random_data};
pub use mget::{mget, VerifyFn, MGET_TIMEOUT};
pub use mput::{mput, mput_chunks};
pub use scenario::{check_store_correct, check_store_random, ScenarioTimings};
pub use verify::verify_chunk;

use params::StoreKind;

/// Opens a fresh store of the given kind. Must be called inside a tokio runtime.
pub fn open_store(kind: StoreKind, buffer_capacity: usize) -> Arc<dyn ChunkStore> {
    match kind {
        StoreKind::Map => Arc::new(MapChunkStore::new()),
        StoreKind::Buffered => {
            Arc::new(BufferedChunkStore::new(MapChunkStore::new(), buffer_capacity))
        }
    }
}
