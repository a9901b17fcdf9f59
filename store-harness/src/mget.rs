use std::sync::Arc;
use std::time::Duration;

use chunk_store::{Chunk, ChunkStore, Key};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::errors::{HarnessError, HarnessResult};

/// Wall-clock budget for a whole `mget` batch.
pub const MGET_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-chunk check run on every retrieved chunk.
pub type Verify = dyn Fn(&Key, &Chunk) -> HarnessResult<()> + Send + Sync;

pub type VerifyFn = Arc<Verify>;

/// Bulk read pipeline.
///
/// Spawns one retrieval task per key. Each task fetches its chunk, waits for
/// it to materialize if the store hands back a confirm, and runs `verify`.
/// The first error reported by any task wins; if nothing has failed and the
/// batch is still running after [`MGET_TIMEOUT`], the call fails with
/// `HarnessError::Timeout` and the outstanding tasks are cancelled.
#[tracing::instrument(skip_all, fields(keys = keys.len()))]
pub async fn mget<S>(store: Arc<S>, keys: &[Key], verify: Option<VerifyFn>) -> HarnessResult<()>
where
    S: ChunkStore + ?Sized + 'static,
{
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    let mut fetches = JoinSet::new();
    for key in keys.iter().copied() {
        let store = store.clone();
        let verify = verify.clone();
        let err_tx = err_tx.clone();
        fetches.spawn(async move {
            if let Err(err) = fetch_chunk(store.as_ref(), &key, verify.as_deref()).await {
                tracing::debug!(%key, error = %err, "mget fetch failed");
                let _ = err_tx.send(err);
            }
        });
    }

    // closes the error channel once every fetch has finished
    let collector = tokio::spawn(async move {
        while let Some(joined) = fetches.join_next().await {
            if let Err(err) = joined {
                let _ = err_tx.send(HarnessError::Task(err));
            }
        }
    });

    let outcome = match tokio::time::timeout(MGET_TIMEOUT, err_rx.recv()).await {
        Ok(Some(err)) => Err(err),
        Ok(None) => Ok(()),
        Err(_) => {
            tracing::warn!(timeout = ?MGET_TIMEOUT, "mget timed out");
            Err(HarnessError::Timeout(MGET_TIMEOUT))
        }
    };
    // dropping the collector's JoinSet aborts whatever is still in flight
    collector.abort();
    outcome
}

async fn fetch_chunk<S>(store: &S, key: &Key, verify: Option<&Verify>) -> HarnessResult<()>
where
    S: ChunkStore + ?Sized,
{
    let (chunk, confirm) = store.get(key).await?;
    let chunk = match confirm {
        Some(confirm) => confirm.await?,
        None => chunk,
    };
    if let Some(verify) = verify {
        verify(key, &chunk)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mput::mput_chunks;
    use crate::verify::verify_chunk;
    use async_trait::async_trait;
    use chunk_store::{
        BufferedChunkStore, ChunkResult, ChunkStoreError, GetConfirm, MapChunkStore, PutConfirm,
        KEY_LENGTH,
    };

    /// A store whose reads never complete.
    struct StalledStore;

    #[async_trait]
    impl ChunkStore for StalledStore {
        async fn put(&self, chunk: Arc<Chunk>) -> ChunkResult<Option<PutConfirm>> {
            chunk.stored().mark_stored();
            Ok(None)
        }

        async fn get(&self, _key: &Key) -> ChunkResult<(Arc<Chunk>, Option<GetConfirm>)> {
            std::future::pending().await
        }

        async fn close(&self) {}
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_back_written_chunks() {
        let store = Arc::new(MapChunkStore::new());
        let keys = mput_chunks(store.clone(), 4, 30, 256).await.unwrap();
        mget(store.clone(), &keys, None).await.unwrap();
        mget(store, &keys, Some(Arc::new(verify_chunk))).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_key_list() {
        let store = Arc::new(MapChunkStore::new());
        mget(store, &[], None).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = Arc::new(MapChunkStore::new());
        let mut keys = mput_chunks(store.clone(), 2, 5, 64).await.unwrap();
        keys.push(Key::new([0xAB; KEY_LENGTH]));

        let err = mget(store, &keys, None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_verify_error_propagates() {
        let store = Arc::new(MapChunkStore::new());
        let keys = mput_chunks(store.clone(), 2, 5, 64).await.unwrap();
        let reject_all: VerifyFn = Arc::new(|key: &Key, _chunk: &Chunk| {
            Err(HarnessError::HashMismatch {
                key: *key,
                expected: Key::new([0; KEY_LENGTH]),
            })
        });

        let err = mget(store, &keys, Some(reject_all)).await.unwrap_err();
        assert!(matches!(err, HarnessError::HashMismatch { .. }));
    }

    #[tokio::test]
    async fn test_tampered_chunk_fails_verification() {
        let store = Arc::new(MapChunkStore::new());
        let honest = Chunk::from_body(b"honest");
        let tampered = Chunk::new(*honest.key(), Chunk::from_body(b"tampered").data().to_vec());
        store.put(Arc::new(tampered)).await.unwrap();

        let err = mget(store, &[*honest.key()], Some(Arc::new(verify_chunk)))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::HashMismatch { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_times_out() {
        let store = Arc::new(StalledStore);
        let keys = vec![Key::new([1; KEY_LENGTH]), Key::new([2; KEY_LENGTH])];

        let started = tokio::time::Instant::now();
        let err = mget(store, &keys, None).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, HarnessError::Timeout(d) if d == MGET_TIMEOUT));
        assert!(elapsed >= MGET_TIMEOUT);
        assert!(elapsed < MGET_TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_pending_buffered_chunks() {
        let store = Arc::new(BufferedChunkStore::new(MapChunkStore::new(), 16));
        let chunks: Vec<Arc<Chunk>> = (0..20u32)
            .map(|i| Arc::new(Chunk::from_body(&i.to_be_bytes())))
            .collect();
        let mut keys = Vec::new();
        for chunk in &chunks {
            // do not wait for durability; mget must wait through the get confirm
            store.put(chunk.clone()).await.unwrap();
            keys.push(*chunk.key());
        }

        mget(store.clone(), &keys, Some(Arc::new(verify_chunk)))
            .await
            .unwrap();
        store.close().await;
        assert!(matches!(
            store.put(chunks[0].clone()).await.err(),
            Some(ChunkStoreError::Closed)
        ));
    }
}
