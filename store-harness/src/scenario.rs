use std::sync::Arc;
use std::time::{Duration, Instant};

use chunk_store::ChunkStore;
use serde::Serialize;

use crate::errors::HarnessResult;
use crate::mget::{mget, VerifyFn};
use crate::mput::mput_chunks;
use crate::verify::verify_chunk;

/// Writes random chunks and checks every key can be read back.
pub async fn check_store_random<S>(
    store: Arc<S>,
    processors: usize,
    n: usize,
    body_size: usize,
) -> HarnessResult<ScenarioTimings>
where
    S: ChunkStore + ?Sized + 'static,
{
    run_scenario(store, processors, n, body_size, false).await
}

/// Writes random chunks, reads them back and verifies each one's key
/// against its content.
pub async fn check_store_correct<S>(
    store: Arc<S>,
    processors: usize,
    n: usize,
    body_size: usize,
) -> HarnessResult<ScenarioTimings>
where
    S: ChunkStore + ?Sized + 'static,
{
    run_scenario(store, processors, n, body_size, true).await
}

/// How long each pipeline took in a scenario run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScenarioTimings {
    #[serde(serialize_with = "as_millis")]
    pub write: Duration,
    #[serde(serialize_with = "as_millis")]
    pub read: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

async fn run_scenario<S>(
    store: Arc<S>,
    processors: usize,
    n: usize,
    body_size: usize,
    verify: bool,
) -> HarnessResult<ScenarioTimings>
where
    S: ChunkStore + ?Sized + 'static,
{
    let started = Instant::now();
    let keys = mput_chunks(store.clone(), processors, n, body_size).await?;
    let write = started.elapsed();
    tracing::info!(chunks = keys.len(), elapsed = ?write, "chunks written");

    let started = Instant::now();
    let verify: Option<VerifyFn> = if verify {
        Some(Arc::new(verify_chunk))
    } else {
        None
    };
    mget(store, &keys, verify).await?;
    let read = started.elapsed();
    tracing::info!(chunks = keys.len(), elapsed = ?read, "chunks read back");

    Ok(ScenarioTimings { write, read })
}
