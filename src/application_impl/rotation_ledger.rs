use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Upper bound on every store round trip.
    pub timeout: Duration,
    /// Expiry applied to rotation records; `None` leaves cleanup to operators.
    pub record_ttl: Option<Duration>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(500),
            record_ttl: None,
        }
    }
}

/// Called when a refresh token is presented by a second, different request.
///
/// This is where an integrating service can revoke the whole session family.
#[async_trait::async_trait]
pub trait ReuseHook: Send + Sync {
    async fn on_reuse(
        &self,
        key: &RotationKey,
        subject_id: SubjectId,
        request_id: &RequestId,
        owner: &RequestId,
    );
}

#[derive(Debug, Default)]
pub struct LogReuse;

#[async_trait::async_trait]
impl ReuseHook for LogReuse {
    async fn on_reuse(
        &self,
        key: &RotationKey,
        subject_id: SubjectId,
        request_id: &RequestId,
        owner: &RequestId,
    ) {
        error!(
            %key,
            %subject_id,
            %request_id,
            %owner,
            "refresh token reused by a different request, possible credential theft"
        );
    }
}

/// One-time-use protocol for refresh tokens.
pub struct RotationLedger {
    store: Arc<dyn RotationStore>,
    cfg: LedgerConfig,
    reuse_hook: Arc<dyn ReuseHook>,
}

impl RotationLedger {
    pub fn new(store: Arc<dyn RotationStore>, cfg: LedgerConfig) -> Self {
        Self {
            store,
            cfg,
            reuse_hook: Arc::new(LogReuse),
        }
    }

    pub fn with_reuse_hook(mut self, hook: Arc<dyn ReuseHook>) -> Self {
        self.reuse_hook = hook;
        self
    }

    pub async fn begin_rotation(&self, key: &RotationKey) -> Result<(), AuthError> {
        self.bounded(self.store.put_unused(key, self.cfg.record_ttl))
            .await
    }

    pub async fn is_active(&self, key: &RotationKey) -> Result<bool, AuthError> {
        Ok(self.bounded(self.store.state(key)).await?.is_some())
    }

    /// Exchange the refresh token identified by `key` for a new session pair.
    ///
    /// `producer` is only called while the record is still unused. Retries
    /// carrying the same `request_id` get the cached pair back; any other
    /// request id is a reuse and fails with [`AuthError::RotationConflict`].
    ///
    /// Minting happens before the atomic commit. Once a commit has landed the
    /// producer is never called again, but requests that all read the record
    /// as unused before that each mint a pair. Only the committed pair is
    /// returned and only its next key is registered; the others are dropped
    /// and their refresh tokens fail with [`AuthError::RotationNotFound`].
    pub async fn rotate<F>(
        &self,
        key: &RotationKey,
        request_id: &RequestId,
        subject_id: SubjectId,
        producer: F,
    ) -> Result<SessionPair, AuthError>
    where
        F: FnOnce(SubjectId) -> Result<(SessionPair, RotationKey), AuthError> + Send,
    {
        let state = self
            .bounded(self.store.state(key))
            .await?
            .ok_or(AuthError::RotationNotFound)?;

        match state {
            RotationState::ConsumedBy(owner) if &owner == request_id => {
                debug!(%key, %request_id, "replaying rotation");
                self.cached_pair(key).await
            }
            RotationState::ConsumedBy(owner) => {
                self.conflict(key, subject_id, request_id, &owner).await
            }
            RotationState::Unused => {
                let (pair, next_key) = producer(subject_id)?;
                let issued = serde_json::to_string(&pair)
                    .map_err(|e| AuthError::Internal(format!("serialize session pair: {}", e)))?;

                let outcome = self
                    .bounded(self.store.commit(
                        key,
                        request_id,
                        &issued,
                        &next_key,
                        self.cfg.record_ttl,
                    ))
                    .await?;

                match outcome {
                    CommitOutcome::Committed => {
                        debug!(%key, %request_id, %subject_id, "rotation committed");
                        Ok(pair)
                    }
                    CommitOutcome::Lost(RotationState::ConsumedBy(owner))
                        if &owner == request_id =>
                    {
                        debug!(%key, %request_id, "lost rotation race to a duplicate");
                        self.cached_pair(key).await
                    }
                    CommitOutcome::Lost(RotationState::ConsumedBy(owner)) => {
                        self.conflict(key, subject_id, request_id, &owner).await
                    }
                    CommitOutcome::Lost(RotationState::Unused) => Err(AuthError::Internal(
                        "store refused commit on an unused record".to_string(),
                    )),
                    CommitOutcome::Missing => Err(AuthError::RotationNotFound),
                }
            }
        }
    }

    async fn cached_pair(&self, key: &RotationKey) -> Result<SessionPair, AuthError> {
        let raw = self
            .bounded(self.store.issued(key))
            .await?
            .ok_or_else(|| AuthError::Internal(format!("issued pair missing for {}", key)))?;
        serde_json::from_str(&raw)
            .map_err(|e| AuthError::Internal(format!("deserialize session pair: {}", e)))
    }

    async fn conflict(
        &self,
        key: &RotationKey,
        subject_id: SubjectId,
        request_id: &RequestId,
        owner: &RequestId,
    ) -> Result<SessionPair, AuthError> {
        self.reuse_hook
            .on_reuse(key, subject_id, request_id, owner)
            .await;
        Err(AuthError::RotationConflict)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.cfg.timeout, call).await {
            Ok(result) => result.map_err(|e| AuthError::Internal(e.to_string())),
            Err(_) => Err(AuthError::Internal(format!(
                "store call exceeded {:?}",
                self.cfg.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryRotationStore;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(s: &str) -> RotationKey {
        RotationKey(s.to_string())
    }

    fn req(s: &str) -> RequestId {
        s.parse().unwrap()
    }

    fn minted(n: usize) -> (SessionPair, RotationKey) {
        (
            SessionPair {
                access: SignedCredential(format!("access-{}", n)),
                refresh: SignedCredential(format!("refresh-{}", n)),
            },
            RotationKey(format!("next-{}", n)),
        )
    }

    async fn ledger_with_key(k: &str) -> (RotationLedger, Arc<MemoryRotationStore>) {
        let store = Arc::new(MemoryRotationStore::new());
        let ledger = RotationLedger::new(store.clone(), LedgerConfig::default());
        ledger.begin_rotation(&key(k)).await.unwrap();
        (ledger, store)
    }

    #[tokio::test]
    async fn retry_with_same_request_is_idempotent() {
        let (ledger, _) = ledger_with_key("k1").await;
        let calls = AtomicUsize::new(0);
        let produce = |_: SubjectId| -> Result<(SessionPair, RotationKey), AuthError> {
            Ok(minted(calls.fetch_add(1, Ordering::SeqCst)))
        };

        let first = ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(1), produce)
            .await
            .unwrap();
        let second = ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(1), produce)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_request_is_a_conflict() {
        let (ledger, _) = ledger_with_key("k1").await;
        ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(1), |_| Ok(minted(0)))
            .await
            .unwrap();

        let err = ledger
            .rotate(&key("k1"), &req("req-B"), SubjectId(1), |_| {
                panic!("must not mint on reuse")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RotationConflict));
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let store = Arc::new(MemoryRotationStore::new());
        let ledger = RotationLedger::new(store, LedgerConfig::default());
        let err = ledger
            .rotate(&key("nope"), &req("req-A"), SubjectId(1), |_| Ok(minted(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RotationNotFound));
        assert!(!ledger.is_active(&key("nope")).await.unwrap());
    }

    #[tokio::test]
    async fn commit_registers_next_key() {
        let (ledger, store) = ledger_with_key("k1").await;
        ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(1), |_| Ok(minted(3)))
            .await
            .unwrap();

        assert_eq!(
            store.state(&key("next-3")).await.unwrap(),
            Some(RotationState::Unused)
        );
        assert_eq!(
            store.state(&key("k1")).await.unwrap(),
            Some(RotationState::ConsumedBy(req("req-A")))
        );
    }

    #[tokio::test]
    async fn producer_failure_leaves_record_unused() {
        let (ledger, store) = ledger_with_key("k1").await;
        let err = ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(1), |_| {
                Err(AuthError::Internal("signing: boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        assert_eq!(
            store.state(&key("k1")).await.unwrap(),
            Some(RotationState::Unused)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_rotations_mint_one_winner() {
        let (ledger, _) = ledger_with_key("k1").await;
        let ledger = Arc::new(ledger);

        let mut handles = Vec::new();
        for i in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .rotate(&key("k1"), &req(&format!("req-{}", i)), SubjectId(1), move |_| {
                        Ok(minted(i))
                    })
                    .await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(AuthError::RotationConflict) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_agree_on_one_pair() {
        let (ledger, store) = ledger_with_key("k1").await;
        let ledger = Arc::new(ledger);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let ledger = ledger.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .rotate(&key("k1"), &req("req-A"), SubjectId(1), move |_| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(minted(i))
                    })
                    .await
            }));
        }

        let mut pairs = Vec::new();
        for handle in handles {
            pairs.push(handle.await.unwrap().unwrap());
        }
        assert!(pairs.windows(2).all(|w| w[0] == w[1]));

        // Racing readers may each mint, but never more than one per request.
        let minted_during_race = calls.load(Ordering::SeqCst);
        assert!((1..=8).contains(&minted_during_race));

        let mut registered = 0;
        for i in 0..8 {
            if store.state(&key(&format!("next-{}", i))).await.unwrap().is_some() {
                registered += 1;
            }
        }
        assert_eq!(registered, 1);

        // After the commit a retry is served from cache without minting.
        let retried = ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(1), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(minted(99))
            })
            .await
            .unwrap();
        assert_eq!(retried, pairs[0]);
        assert_eq!(calls.load(Ordering::SeqCst), minted_during_race);
    }

    #[derive(Default)]
    struct RecordingHook {
        seen: Mutex<Vec<(String, u64, String, String)>>,
    }

    #[async_trait::async_trait]
    impl ReuseHook for RecordingHook {
        async fn on_reuse(
            &self,
            key: &RotationKey,
            subject_id: SubjectId,
            request_id: &RequestId,
            owner: &RequestId,
        ) {
            self.seen.lock().unwrap().push((
                key.to_string(),
                subject_id.0,
                request_id.to_string(),
                owner.to_string(),
            ));
        }
    }

    #[tokio::test]
    async fn reuse_hook_sees_conflicts() {
        let store = Arc::new(MemoryRotationStore::new());
        let hook = Arc::new(RecordingHook::default());
        let ledger = RotationLedger::new(store, LedgerConfig::default()).with_reuse_hook(hook.clone());
        ledger.begin_rotation(&key("k1")).await.unwrap();

        ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(4), |_| Ok(minted(0)))
            .await
            .unwrap();
        let _ = ledger
            .rotate(&key("k1"), &req("req-B"), SubjectId(4), |_| Ok(minted(1)))
            .await;

        let seen = hook.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(
                "k1".to_string(),
                4,
                "req-B".to_string(),
                "req-A".to_string()
            )]
        );
    }

    struct StalledStore;

    #[async_trait::async_trait]
    impl RotationStore for StalledStore {
        async fn put_unused(
            &self,
            _key: &RotationKey,
            _ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn state(&self, _key: &RotationKey) -> Result<Option<RotationState>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn issued(&self, _key: &RotationKey) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn commit(
            &self,
            _key: &RotationKey,
            _request_id: &RequestId,
            _issued: &str,
            _next_key: &RotationKey,
            _ttl: Option<Duration>,
        ) -> Result<CommitOutcome, StoreError> {
            Ok(CommitOutcome::Missing)
        }
    }

    #[tokio::test]
    async fn stalled_store_times_out() {
        let ledger = RotationLedger::new(
            Arc::new(StalledStore),
            LedgerConfig {
                timeout: Duration::from_millis(20),
                record_ttl: None,
            },
        );
        let err = ledger
            .rotate(&key("k1"), &req("req-A"), SubjectId(1), |_| Ok(minted(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        assert!(matches!(
            ledger.begin_rotation(&key("k1")).await,
            Err(AuthError::Internal(_))
        ));
    }
}
