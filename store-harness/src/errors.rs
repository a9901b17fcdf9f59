use std::time::Duration;

use chunk_store::{ChunkStoreError, Key};
use thiserror::Error;
use tokio::task::JoinError;

pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("chunk store error: {0}")]
    Store(#[from] ChunkStoreError),

    #[error("key {requested} does not match retrieved chunk key {found}")]
    KeyMismatch { requested: Key, found: Key },

    #[error("key {key} is not the hash of the chunk data (expected {expected})")]
    HashMismatch { key: Key, expected: Key },

    #[error("timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("pipeline task failed")]
    Task(#[from] JoinError),
}

impl HarnessError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HarnessError::Store(err) if err.is_not_found())
    }
}
