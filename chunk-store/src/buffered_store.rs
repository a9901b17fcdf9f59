use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;

use crate::chunk::{Chunk, Key};
use crate::error::{ChunkResult, ChunkStoreError};
use crate::store::{ChunkStore, GetConfirm, PutConfirm};

type Pending = Arc<RwLock<HashMap<Key, Arc<Chunk>>>>;

/// Upper bound on the batch buffer allocated up front by the flush task.
const BATCH_PREALLOC: usize = 256;

/// A `ChunkStore` that accepts writes into a queue and persists them to an
/// inner store from a background flush task.
///
/// `put` returns as soon as the chunk is queued, together with a confirm
/// that resolves once the inner store holds it. Reads see queued chunks
/// before they land, paired with a confirm that waits for durability.
pub struct BufferedChunkStore<S> {
    inner: Arc<S>,
    pending: Pending,
    queue: Mutex<Option<mpsc::Sender<Arc<Chunk>>>>,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

impl<S> BufferedChunkStore<S>
where
    S: ChunkStore + 'static,
{
    /// Wraps `inner`, spawning the flush task on the current tokio runtime.
    /// `capacity` bounds both the queue and the size of a flush batch, and is
    /// clamped to what a tokio channel can hold.
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        let inner = Arc::new(inner);
        let pending: Pending = Arc::new(RwLock::new(HashMap::new()));
        let (tx, rx) = mpsc::channel(capacity);
        let flusher = tokio::spawn(flush_loop(inner.clone(), pending.clone(), rx, capacity));
        Self {
            inner,
            pending,
            queue: Mutex::new(Some(tx)),
            flusher: Mutex::new(Some(flusher)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of chunks accepted but not yet persisted.
    pub async fn pending_len(&self) -> usize {
        self.pending.read().await.len()
    }
}

async fn flush_loop<S>(
    inner: Arc<S>,
    pending: Pending,
    mut rx: mpsc::Receiver<Arc<Chunk>>,
    capacity: usize,
) where
    S: ChunkStore + 'static,
{
    let mut batch = Vec::with_capacity(capacity.min(BATCH_PREALLOC));
    while let Some(chunk) = rx.recv().await {
        batch.push(chunk);
        while batch.len() < capacity {
            match rx.try_recv() {
                Ok(chunk) => batch.push(chunk),
                Err(_) => break,
            }
        }
        tracing::debug!(batch = batch.len(), "flushing buffered chunks");

        for chunk in batch.drain(..) {
            if let Err(err) = persist(inner.as_ref(), chunk.clone()).await {
                tracing::warn!(key = %chunk.key(), error = %err, "buffered write failed");
                chunk.stored().mark_failed(err);
            }
            let mut pending = pending.write().await;
            if pending
                .get(chunk.key())
                .is_some_and(|queued| Arc::ptr_eq(queued, &chunk))
            {
                pending.remove(chunk.key());
            }
        }
    }
    tracing::debug!("buffered store flush task drained");
}

async fn persist<S: ChunkStore + ?Sized>(inner: &S, chunk: Arc<Chunk>) -> ChunkResult<()> {
    if let Some(confirm) = inner.put(chunk.clone()).await? {
        confirm.await?;
    }
    // inner stores resolve the signal on success; this covers any that don't
    chunk.stored().mark_stored();
    Ok(())
}

#[async_trait]
impl<S> ChunkStore for BufferedChunkStore<S>
where
    S: ChunkStore + 'static,
{
    async fn put(&self, chunk: Arc<Chunk>) -> ChunkResult<Option<PutConfirm>> {
        let tx = self
            .queue
            .lock()
            .await
            .clone()
            .ok_or(ChunkStoreError::Closed)?;

        self.pending
            .write()
            .await
            .insert(*chunk.key(), chunk.clone());
        if tx.send(chunk.clone()).await.is_err() {
            self.pending.write().await.remove(chunk.key());
            return Err(ChunkStoreError::Closed);
        }

        let confirm: PutConfirm = Box::pin(async move { chunk.stored().wait().await });
        Ok(Some(confirm))
    }

    async fn get(&self, key: &Key) -> ChunkResult<(Arc<Chunk>, Option<GetConfirm>)> {
        // a chunk leaves `pending` only after the inner store holds it, so
        // checking pending first never misses an accepted chunk
        let queued = self.pending.read().await.get(key).cloned();
        match queued {
            Some(chunk) => {
                let waiting = chunk.clone();
                let confirm: GetConfirm = Box::pin(async move {
                    waiting.stored().wait().await?;
                    Ok(waiting)
                });
                Ok((chunk, Some(confirm)))
            }
            None => self.inner.get(key).await,
        }
    }

    async fn close(&self) {
        // dropping the sender lets the flush task drain what is queued and exit
        self.queue.lock().await.take();
        let flusher = self.flusher.lock().await.take();
        if let Some(flusher) = flusher {
            if let Err(err) = flusher.await {
                tracing::warn!(error = %err, "buffered store flush task failed");
            }
            self.inner.close().await;
        }
    }
}
