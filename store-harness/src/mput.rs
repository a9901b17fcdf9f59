use std::sync::Arc;

use chunk_store::{Chunk, ChunkStore, Key};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::errors::{HarnessError, HarnessResult};
use crate::generate::generate_random_chunk;

/// Writes `n` random chunks of `body_size` bytes through `processors` workers.
pub async fn mput_chunks<S>(
    store: Arc<S>,
    processors: usize,
    n: usize,
    body_size: usize,
) -> HarnessResult<Vec<Key>>
where
    S: ChunkStore + ?Sized + 'static,
{
    mput(store, processors, n, |_| generate_random_chunk(body_size)).await
}

/// Bulk write pipeline.
///
/// `processors` workers pull chunks off a shared single-slot queue. For every
/// chunk a worker spawns a completion task that calls `put`, awaits any
/// confirm, then waits on the chunk's stored signal. The driver generates
/// chunks in order, so it blocks whenever every worker is busy.
///
/// Returns the keys in generation order once every worker and completion
/// task has finished. If any write failed, the earliest failure reported is
/// returned instead. There is no timeout: a store that never resolves a chunk's
/// stored signal blocks this call forever.
#[tracing::instrument(skip(store, generate))]
pub async fn mput<S, F>(
    store: Arc<S>,
    processors: usize,
    n: usize,
    mut generate: F,
) -> HarnessResult<Vec<Key>>
where
    S: ChunkStore + ?Sized + 'static,
    F: FnMut(u64) -> Chunk,
{
    let (tx, rx) = mpsc::channel::<Arc<Chunk>>(1);
    let rx = Arc::new(Mutex::new(rx));
    // failures arrive in the order they happen, whichever worker saw them
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    let mut workers = JoinSet::new();
    for worker in 0..processors.max(1) {
        let rx = rx.clone();
        let store = store.clone();
        let span = tracing::debug_span!("mput_worker", worker);
        workers.spawn(run_worker(store, rx, err_tx.clone()).instrument(span));
    }

    let mut keys = Vec::with_capacity(n);
    for i in 0..n {
        let chunk = Arc::new(generate(i as u64));
        keys.push(*chunk.key());
        if tx.send(chunk).await.is_err() {
            // every worker has exited; the join below reports why
            break;
        }
    }
    drop(tx);

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            let _ = err_tx.send(HarnessError::Task(err));
        }
    }
    drop(err_tx);

    match err_rx.recv().await {
        Some(err) => Err(err),
        None => {
            tracing::debug!(chunks = keys.len(), "mput complete");
            Ok(keys)
        }
    }
}

type WorkQueue = Arc<Mutex<mpsc::Receiver<Arc<Chunk>>>>;

async fn run_worker<S>(store: Arc<S>, rx: WorkQueue, errors: mpsc::UnboundedSender<HarnessError>)
where
    S: ChunkStore + ?Sized + 'static,
{
    let mut completions = JoinSet::new();
    loop {
        let next = rx.lock().await.recv().await;
        let Some(chunk) = next else { break };
        let store = store.clone();
        let errors = errors.clone();
        completions.spawn(async move {
            if let Err(err) = store_chunk(store, chunk).await {
                let _ = errors.send(err);
            }
        });
    }

    while let Some(joined) = completions.join_next().await {
        if let Err(err) = joined {
            let _ = errors.send(HarnessError::Task(err));
        }
    }
}

async fn store_chunk<S>(store: Arc<S>, chunk: Arc<Chunk>) -> HarnessResult<()>
where
    S: ChunkStore + ?Sized + 'static,
{
    let confirm = store.put(chunk.clone()).await.inspect_err(|err| {
        tracing::warn!(key = %chunk.key(), error = %err, "put failed");
    })?;
    if let Some(confirm) = confirm {
        confirm.await?;
    }
    chunk.stored().wait().await?;
    Ok(())
}
