use crate::domain_model::{RequestId, RotationKey, RotationState};
use std::time::Duration;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CommitOutcome {
    /// State moved from unused to the caller's request id.
    Committed,
    /// Someone else got there first; carries the state they left behind.
    Lost(RotationState),
    Missing,
}

/// Backing store for the rotation ledger.
///
/// Only the ledger talks to this trait. `commit` must be a single atomic
/// step in the backing store: check the state is still unused, record the
/// consuming request, cache the issued pair and register the next key.
#[async_trait::async_trait]
pub trait RotationStore: Send + Sync {
    async fn put_unused(&self, key: &RotationKey, ttl: Option<Duration>)
    -> Result<(), StoreError>;

    async fn state(&self, key: &RotationKey) -> Result<Option<RotationState>, StoreError>;

    async fn issued(&self, key: &RotationKey) -> Result<Option<String>, StoreError>;

    async fn commit(
        &self,
        key: &RotationKey,
        request_id: &RequestId,
        issued: &str,
        next_key: &RotationKey,
        ttl: Option<Duration>,
    ) -> Result<CommitOutcome, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Store(String),
    #[error("unexpected store reply: {0}")]
    Protocol(String),
}
