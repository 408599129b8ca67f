use super::RotationLedger;
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;
use tracing::info;

pub struct RealSessionService {
    issuer: Arc<dyn TokenIssuer>,
    ledger: Arc<RotationLedger>,
}

impl RealSessionService {
    pub fn new(issuer: Arc<dyn TokenIssuer>, ledger: Arc<RotationLedger>) -> Self {
        Self { issuer, ledger }
    }
}

fn mint_pair(
    issuer: &dyn TokenIssuer,
    subject_id: SubjectId,
    tag: &str,
) -> Result<(SessionPair, RotationKey), AuthError> {
    let access = issuer.issue_access_token(subject_id, tag)?;
    let (refresh, rotation_key) = issuer.issue_refresh_token(subject_id, tag)?;
    Ok((SessionPair { access, refresh }, rotation_key))
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn create_session(
        &self,
        subject_id: SubjectId,
        issuer: &str,
    ) -> Result<SessionPair, AuthError> {
        let (pair, rotation_key) = mint_pair(self.issuer.as_ref(), subject_id, issuer)?;
        self.ledger.begin_rotation(&rotation_key).await?;
        info!(%subject_id, issuer, "session created");
        Ok(pair)
    }

    async fn refresh_session(
        &self,
        identity: &Identity,
        request_id: &RequestId,
    ) -> Result<SessionPair, AuthError> {
        let rotation_key = identity
            .rotation_key
            .as_ref()
            .ok_or_else(|| AuthError::Invalid("identity carries no rotation key".to_string()))?;

        let issuer = self.issuer.clone();
        self.ledger
            .rotate(rotation_key, request_id, identity.subject_id, |subject_id| {
                mint_pair(issuer.as_ref(), subject_id, request_id.as_str())
            })
            .await
    }
}
