use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::chunk::{Chunk, Key};
use crate::error::{ChunkResult, ChunkStoreError};
use crate::store::{ChunkStore, GetConfirm, PutConfirm};

/// A very simple `ChunkStore` that keeps chunks in a map in memory.
///
/// Writes complete under the lock, so `put` resolves the chunk's stored
/// signal itself and never hands back a confirm.
#[derive(Debug, Default)]
pub struct MapChunkStore {
    chunks: RwLock<HashMap<String, Arc<Chunk>>>,
}

impl MapChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

#[async_trait]
impl ChunkStore for MapChunkStore {
    async fn put(&self, chunk: Arc<Chunk>) -> ChunkResult<Option<PutConfirm>> {
        {
            let mut chunks = self.chunks.write().await;
            chunks.insert(chunk.key().hex(), chunk.clone());
        }
        chunk.stored().mark_stored();
        Ok(None)
    }

    async fn get(&self, key: &Key) -> ChunkResult<(Arc<Chunk>, Option<GetConfirm>)> {
        let chunks = self.chunks.read().await;
        match chunks.get(&key.hex()) {
            Some(chunk) => Ok((chunk.clone(), None)),
            None => Err(ChunkStoreError::NotFound),
        }
    }

    async fn close(&self) {}
}
