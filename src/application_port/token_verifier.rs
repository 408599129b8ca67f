use super::AuthError;
use crate::domain_model::{Identity, TokenKind};

/// Verify a bearer token of a given kind and return who presented it.
///
/// Implemented once per trust backend; the auth gate holds exactly one.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str, kind: TokenKind) -> Result<Identity, AuthError>;
}
