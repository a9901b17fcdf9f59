use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::chunk::{Chunk, Key};
use crate::error::ChunkResult;

/// Awaited by a writer to learn that an accepted chunk is durable.
pub type PutConfirm = Pin<Box<dyn Future<Output = ChunkResult<()>> + Send>>;

/// Awaited by a reader when the returned chunk is still being materialized.
pub type GetConfirm = Pin<Box<dyn Future<Output = ChunkResult<Arc<Chunk>>> + Send>>;

/// Trait for storing and fetching chunks by their content address.
///
/// Every implementation resolves the chunk's `StoredSignal` once the write
/// is durable. A store that completes writes inside `put` resolves it there
/// and returns no confirm; a store that persists in the background returns a
/// `PutConfirm` and resolves the signal (or fails it) when the write lands.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Submits a chunk for storage.
    async fn put(&self, chunk: Arc<Chunk>) -> ChunkResult<Option<PutConfirm>>;

    /// Looks up a chunk. Absent keys yield `ChunkStoreError::NotFound`.
    async fn get(&self, key: &Key) -> ChunkResult<(Arc<Chunk>, Option<GetConfirm>)>;

    /// Releases held resources. Operations after close may be rejected.
    async fn close(&self);
}
