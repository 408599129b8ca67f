use super::RotationLedger;
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

fn identity_from_claims(claims: Claims, required: TokenKind) -> Result<Identity, AuthError> {
    if claims.kind != required {
        return Err(AuthError::kind_mismatch(required, claims.kind));
    }
    Ok(Identity {
        subject_id: claims.subject_id,
        role_id: None,
        rotation_key: match required {
            TokenKind::Refresh => claims.rotation_key,
            TokenKind::Access => None,
        },
    })
}

/// Signature and claim checks only, no I/O.
pub struct LocalJwtVerifier {
    validator: Arc<dyn TokenValidator>,
}

impl LocalJwtVerifier {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait::async_trait]
impl TokenVerifier for LocalJwtVerifier {
    async fn verify(&self, token: &str, kind: TokenKind) -> Result<Identity, AuthError> {
        let claims = self.validator.validate(token)?;
        identity_from_claims(claims, kind)
    }
}

/// Local checks plus, for refresh tokens, a lookup that the rotation record
/// still exists in the ledger.
pub struct LedgerJwtVerifier {
    validator: Arc<dyn TokenValidator>,
    ledger: Arc<RotationLedger>,
}

impl LedgerJwtVerifier {
    pub fn new(validator: Arc<dyn TokenValidator>, ledger: Arc<RotationLedger>) -> Self {
        Self { validator, ledger }
    }
}

#[async_trait::async_trait]
impl TokenVerifier for LedgerJwtVerifier {
    async fn verify(&self, token: &str, kind: TokenKind) -> Result<Identity, AuthError> {
        let claims = self.validator.validate(token)?;
        let identity = identity_from_claims(claims, kind)?;

        if let Some(key) = &identity.rotation_key {
            if !self.ledger.is_active(key).await? {
                return Err(AuthError::RotationNotFound);
            }
        }
        Ok(identity)
    }
}

pub struct RemoteVerifier {
    authority: Arc<dyn RemoteAuthority>,
    timeout: Duration,
}

impl RemoteVerifier {
    pub fn new(authority: Arc<dyn RemoteAuthority>, timeout: Duration) -> Self {
        Self { authority, timeout }
    }
}

#[async_trait::async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(&self, token: &str, kind: TokenKind) -> Result<Identity, AuthError> {
        let grant = match tokio::time::timeout(self.timeout, self.authority.check(token, kind)).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "remote authority deadline elapsed");
                return Err(AuthError::Unreachable(format!(
                    "no answer within {:?}",
                    self.timeout
                )));
            }
        };

        if grant.subject_id.is_zero() {
            return Err(AuthError::Invalid("authority returned no subject".to_string()));
        }
        Ok(Identity {
            subject_id: grant.subject_id,
            role_id: Some(grant.role_id),
            rotation_key: match kind {
                TokenKind::Refresh => grant.rotation_key,
                TokenKind::Access => None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{FakeRemoteAuthority, LedgerConfig};
    use crate::infra_memory::MemoryRotationStore;
    use chrono::{Duration as ChronoDuration, Utc};

    struct StaticValidator(Result<Claims, AuthError>);

    impl TokenValidator for StaticValidator {
        fn validate(&self, _token: &str) -> Result<Claims, AuthError> {
            self.0.clone()
        }
    }

    fn claims(kind: TokenKind, key: Option<&str>) -> Claims {
        let now = Utc::now();
        Claims {
            subject_id: SubjectId(11),
            kind,
            rotation_key: key.map(|k| RotationKey(k.to_string())),
            issuer: "signin".to_string(),
            issued_at: now,
            expires_at: now + ChronoDuration::minutes(5),
        }
    }

    #[tokio::test]
    async fn local_rejects_kind_mismatch() {
        let verifier =
            LocalJwtVerifier::new(Arc::new(StaticValidator(Ok(claims(TokenKind::Access, None)))));
        let identity = verifier.verify("t", TokenKind::Access).await.unwrap();
        assert_eq!(identity.subject_id, SubjectId(11));
        assert_eq!(identity.rotation_key, None);

        let err = verifier.verify("t", TokenKind::Refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));
    }

    #[tokio::test]
    async fn local_passes_validator_errors_through() {
        let verifier = LocalJwtVerifier::new(Arc::new(StaticValidator(Err(AuthError::Expired))));
        let err = verifier.verify("t", TokenKind::Access).await.unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn ledger_requires_known_rotation_key() {
        let ledger = Arc::new(RotationLedger::new(
            Arc::new(MemoryRotationStore::new()),
            LedgerConfig::default(),
        ));
        let verifier = LedgerJwtVerifier::new(
            Arc::new(StaticValidator(Ok(claims(TokenKind::Refresh, Some("k1"))))),
            ledger.clone(),
        );

        let err = verifier.verify("t", TokenKind::Refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::RotationNotFound));

        ledger
            .begin_rotation(&RotationKey("k1".to_string()))
            .await
            .unwrap();
        let identity = verifier.verify("t", TokenKind::Refresh).await.unwrap();
        assert_eq!(identity.rotation_key, Some(RotationKey("k1".to_string())));
    }

    #[tokio::test]
    async fn remote_maps_grant_to_identity() {
        let authority = FakeRemoteAuthority::new().with_grant(
            "tok",
            TokenKind::Refresh,
            AuthorityGrant {
                subject_id: SubjectId(5),
                role_id: RoleId(2),
                rotation_key: Some(RotationKey("rk".to_string())),
            },
        );
        let verifier = RemoteVerifier::new(Arc::new(authority), Duration::from_secs(1));

        let identity = verifier.verify("tok", TokenKind::Refresh).await.unwrap();
        assert_eq!(identity.subject_id, SubjectId(5));
        assert_eq!(identity.role_id, Some(RoleId(2)));
        assert_eq!(identity.rotation_key, Some(RotationKey("rk".to_string())));

        let err = verifier.verify("tok", TokenKind::Access).await.unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));
    }

    #[tokio::test]
    async fn remote_times_out_as_unreachable() {
        let authority = FakeRemoteAuthority::new().with_delay(Duration::from_secs(5));
        let verifier = RemoteVerifier::new(Arc::new(authority), Duration::from_millis(20));
        let err = verifier.verify("tok", TokenKind::Access).await.unwrap_err();
        assert!(matches!(err, AuthError::Unreachable(_)));
    }

    #[tokio::test]
    async fn remote_zero_subject_is_invalid() {
        let authority = FakeRemoteAuthority::new().with_grant(
            "tok",
            TokenKind::Access,
            AuthorityGrant {
                subject_id: SubjectId(0),
                role_id: RoleId(1),
                rotation_key: None,
            },
        );
        let verifier = RemoteVerifier::new(Arc::new(authority), Duration::from_secs(1));
        let err = verifier.verify("tok", TokenKind::Access).await.unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));
    }
}
