use super::AuthError;
use crate::domain_model::{Identity, RequestId, SessionPair, SubjectId};

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Mint a fresh pair at sign-in and register its refresh token.
    async fn create_session(
        &self,
        subject_id: SubjectId,
        issuer: &str,
    ) -> Result<SessionPair, AuthError>;

    /// Exchange the refresh token behind `identity` for a new pair, once.
    async fn refresh_session(
        &self,
        identity: &Identity,
        request_id: &RequestId,
    ) -> Result<SessionPair, AuthError>;
}
