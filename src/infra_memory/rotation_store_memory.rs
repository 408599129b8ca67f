use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Record {
    state: RotationState,
    issued: Option<String>,
}

/// Process-local rotation store for development and tests.
///
/// The check-and-set in `commit` happens under the entry's shard lock. TTLs
/// are ignored; records live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryRotationStore {
    records: DashMap<String, Record>,
}

impl MemoryRotationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RotationStore for MemoryRotationStore {
    async fn put_unused(
        &self,
        key: &RotationKey,
        _ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.records.insert(
            key.to_string(),
            Record {
                state: RotationState::Unused,
                issued: None,
            },
        );
        Ok(())
    }

    async fn state(&self, key: &RotationKey) -> Result<Option<RotationState>, StoreError> {
        Ok(self.records.get(key.as_str()).map(|r| r.state.clone()))
    }

    async fn issued(&self, key: &RotationKey) -> Result<Option<String>, StoreError> {
        Ok(self
            .records
            .get(key.as_str())
            .and_then(|r| r.issued.clone()))
    }

    async fn commit(
        &self,
        key: &RotationKey,
        request_id: &RequestId,
        issued: &str,
        next_key: &RotationKey,
        _ttl: Option<Duration>,
    ) -> Result<CommitOutcome, StoreError> {
        // The entry guard must be released before touching `next_key`, which
        // may live in the same shard.
        let outcome = match self.records.get_mut(key.as_str()) {
            None => CommitOutcome::Missing,
            Some(mut record) => match &record.state {
                RotationState::Unused => {
                    record.state = RotationState::ConsumedBy(request_id.clone());
                    record.issued = Some(issued.to_string());
                    CommitOutcome::Committed
                }
                consumed => CommitOutcome::Lost(consumed.clone()),
            },
        };

        if outcome == CommitOutcome::Committed {
            self.records.insert(
                next_key.to_string(),
                Record {
                    state: RotationState::Unused,
                    issued: None,
                },
            );
        }
        Ok(outcome)
    }
}
