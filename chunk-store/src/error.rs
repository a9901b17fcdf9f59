use thiserror::Error;

pub type ChunkResult<T> = Result<T, ChunkStoreError>;

/// Errors a `ChunkStore` can report.
///
/// Cloneable because a single durability failure is handed to every task
/// waiting on the chunk's stored signal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChunkStoreError {
    #[error("chunk not found")]
    NotFound,

    #[error("chunk rejected by store: {0}")]
    Rejected(String),

    #[error("chunk store is closed")]
    Closed,

    #[error("malformed chunk: {0}")]
    Malformed(String),
}

impl ChunkStoreError {
    /// True for the not-found sentinel, as opposed to an I/O or store failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChunkStoreError::NotFound)
    }
}
