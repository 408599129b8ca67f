use super::AuthError;
use crate::domain_model::{RoleId, RotationKey, SubjectId, TokenKind};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AuthorityGrant {
    pub subject_id: SubjectId,
    pub role_id: RoleId,
    pub rotation_key: Option<RotationKey>,
}

#[async_trait::async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Errors are already mapped onto `Expired`, `Invalid` or `Unreachable`.
    async fn check(&self, token: &str, kind: TokenKind) -> Result<AuthorityGrant, AuthError>;
}
