use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

const ROTATION_COMMIT: &str = include_str!("rotation_commit.lua");
const ISSUED_SUFFIX: &str = "_issued";

/// Rotation records in Redis: `<key>` holds the state, `<key>_issued` the
/// cached pair.
///
/// `commit` runs as one Lua script and touches three keys, so on a cluster
/// they must share a hash slot (put a hash tag in the prefix).
pub struct RedisRotationStore {
    conn: ConnectionManager,
    prefix: String,
    script: Script,
}

impl RedisRotationStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRotationStore {
            conn,
            prefix: prefix.into(),
            script: Script::new(ROTATION_COMMIT),
        }
    }

    fn key(&self, key: &RotationKey) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }

    fn issued_key(&self, key: &RotationKey) -> String {
        format!("{}{}", self.key(key), ISSUED_SUFFIX)
    }
}

fn ttl_secs(ttl: Option<Duration>) -> u64 {
    ttl.map(|d| d.as_secs().max(1)).unwrap_or(0)
}

fn store_err(e: redis::RedisError) -> StoreError {
    StoreError::Store(e.to_string())
}

#[async_trait::async_trait]
impl RotationStore for RedisRotationStore {
    async fn put_unused(
        &self,
        key: &RotationKey,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        match ttl_secs(ttl) {
            0 => {
                let _: () = conn
                    .set(&key, RotationState::Unused.encode())
                    .await
                    .map_err(store_err)?;
            }
            secs => {
                let _: () = conn
                    .set_ex(&key, RotationState::Unused.encode(), secs)
                    .await
                    .map_err(store_err)?;
            }
        }
        Ok(())
    }

    async fn state(&self, key: &RotationKey) -> Result<Option<RotationState>, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn.get(&key).await.map_err(store_err)?;
        Ok(val.as_deref().map(RotationState::decode))
    }

    async fn issued(&self, key: &RotationKey) -> Result<Option<String>, StoreError> {
        let key = self.issued_key(key);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn.get(&key).await.map_err(store_err)?;
        Ok(val)
    }

    async fn commit(
        &self,
        key: &RotationKey,
        request_id: &RequestId,
        issued: &str,
        next_key: &RotationKey,
        ttl: Option<Duration>,
    ) -> Result<CommitOutcome, StoreError> {
        let mut conn = self.conn.clone();
        let (status, current): (i64, String) = self
            .script
            .key(self.key(key))
            .key(self.issued_key(key))
            .key(self.key(next_key))
            .arg(RotationState::Unused.encode())
            .arg(request_id.as_str())
            .arg(issued)
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;

        match status {
            1 => Ok(CommitOutcome::Committed),
            0 => Ok(CommitOutcome::Lost(RotationState::decode(&current))),
            -1 => Ok(CommitOutcome::Missing),
            other => Err(StoreError::Protocol(format!(
                "unknown commit status {}",
                other
            ))),
        }
    }
}
