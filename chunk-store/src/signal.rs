use tokio::sync::watch;

use crate::error::{ChunkResult, ChunkStoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreState {
    Pending,
    Stored,
    Failed(ChunkStoreError),
}

/// One-shot durability notification owned by a chunk.
///
/// The first call to `mark_stored` or `mark_failed` wins; later calls are
/// ignored. Any number of tasks can `wait` on it, before or after it fires.
#[derive(Debug)]
pub struct StoredSignal {
    state: watch::Sender<StoreState>,
}

impl Default for StoredSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StoredSignal {
    pub fn new() -> Self {
        let (state, _) = watch::channel(StoreState::Pending);
        Self { state }
    }

    /// Resolves the signal as durable. Returns false if it had already fired.
    pub fn mark_stored(&self) -> bool {
        self.resolve(StoreState::Stored)
    }

    /// Resolves the signal with a write failure. Returns false if it had already fired.
    pub fn mark_failed(&self, err: ChunkStoreError) -> bool {
        self.resolve(StoreState::Failed(err))
    }

    pub fn is_resolved(&self) -> bool {
        *self.state.borrow() != StoreState::Pending
    }

    /// Suspends until the signal fires, then reports how the write ended.
    pub async fn wait(&self) -> ChunkResult<()> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| *state != StoreState::Pending)
            .await
            .map(|state| state.clone())
            .map_err(|_| ChunkStoreError::Closed)?;
        match state {
            StoreState::Failed(err) => Err(err),
            _ => Ok(()),
        }
    }

    fn resolve(&self, resolved: StoreState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == StoreState::Pending {
                *state = resolved;
                true
            } else {
                false
            }
        })
    }
}
