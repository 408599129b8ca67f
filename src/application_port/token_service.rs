use super::AuthError;
use crate::domain_model::{Claims, RotationKey, SignedCredential, SubjectId};

pub trait TokenIssuer: Send + Sync {
    fn issue_access_token(
        &self,
        subject_id: SubjectId,
        issuer: &str,
    ) -> Result<SignedCredential, AuthError>;

    fn issue_refresh_token(
        &self,
        subject_id: SubjectId,
        issuer: &str,
    ) -> Result<(SignedCredential, RotationKey), AuthError>;
}

pub trait TokenValidator: Send + Sync {
    /// Fails with [`AuthError::Expired`] only when the signature checks out
    /// and the expiry has passed; every other failure is [`AuthError::Invalid`].
    fn validate(&self, token: &str) -> Result<Claims, AuthError>;
}
