use crate::domain_model::TokenKind;

/// Every way a credential check or session operation can fail.
///
/// String payloads carry diagnostic detail for server-side logs only; they
/// are never rendered into a response body.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("malformed credential: {0}")]
    Malformed(String),
    #[error("invalid credential: {0}")]
    Invalid(String),
    #[error("credential expired")]
    Expired,
    #[error("refresh token reused by another request")]
    RotationConflict,
    #[error("rotation record not found")]
    RotationNotFound,
    #[error("remote authority unreachable: {0}")]
    Unreachable(String),
    #[error("forbidden")]
    Forbidden,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind_mismatch(required: TokenKind, found: TokenKind) -> Self {
        AuthError::Invalid(format!(
            "token kind mismatch: required {}, found {}",
            required, found
        ))
    }
}
