use super::bearer_token;
use crate::application_port::*;
use crate::domain_model::*;
use anyhow::Context;
use std::sync::Arc;
use tracing::{error, warn};
use warp::http::header::HeaderName;
use warp::http::{HeaderMap, StatusCode};

pub const FALLBACK_ERROR_MESSAGE: &str = "Internal server error";

/// What the client sees when authentication fails.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AuthRejection {
    pub status: StatusCode,
    pub message: String,
}

/// Request-level authentication in front of every protected route.
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    localizer: Arc<dyn Localizer>,
    language_header: HeaderName,
}

impl AuthGate {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        localizer: Arc<dyn Localizer>,
        language_header: &str,
    ) -> anyhow::Result<Self> {
        let language_header = HeaderName::from_bytes(language_header.as_bytes())
            .with_context(|| format!("invalid language header name {}", language_header))?;
        Ok(Self {
            verifier,
            localizer,
            language_header,
        })
    }

    /// Resolve the caller behind the request's bearer token.
    ///
    /// With a non-empty `allowed_roles`, an identity carrying a role outside
    /// the list is rejected with 403. Identities without a role are not
    /// filtered.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        kind: TokenKind,
        allowed_roles: Option<&[RoleId]>,
    ) -> Result<Identity, AuthRejection> {
        match self.check(headers, kind, allowed_roles).await {
            Ok(identity) => Ok(identity),
            Err(err) => Err(self.reject_error(err, kind, headers)),
        }
    }

    async fn check(
        &self,
        headers: &HeaderMap,
        kind: TokenKind,
        allowed_roles: Option<&[RoleId]>,
    ) -> Result<Identity, AuthError> {
        let token = bearer_token(headers)?;
        let identity = self.verifier.verify(token, kind).await?;

        // An empty allow-list places no restriction.
        let allowed_roles = allowed_roles.filter(|roles| !roles.is_empty());
        if let (Some(allowed), Some(role_id)) = (allowed_roles, identity.role_id) {
            if !allowed.contains(&role_id) {
                warn!(subject_id = %identity.subject_id, %role_id, "role not allowed");
                return Err(AuthError::Forbidden);
            }
        }
        Ok(identity)
    }

    pub fn language<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get(&self.language_header)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
    }

    /// Log `err` under a fresh issue tag and turn it into a client response.
    pub fn reject_error(&self, err: AuthError, kind: TokenKind, headers: &HeaderMap) -> AuthRejection {
        let issue = nanoid::nanoid!(10);
        match &err {
            AuthError::RotationConflict | AuthError::Internal(_) => {
                error!(%issue, %kind, error = %err, "request rejected")
            }
            _ => warn!(%issue, %kind, error = %err, "request rejected"),
        }

        let (status, message_id) = classify(&err, kind);
        match self.localizer.localize(message_id, self.language(headers)) {
            Ok(message) => AuthRejection { status, message },
            Err(e) => {
                error!(%issue, error = %e, "localization failed");
                AuthRejection {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: FALLBACK_ERROR_MESSAGE.to_string(),
                }
            }
        }
    }
}

pub fn classify(err: &AuthError, kind: TokenKind) -> (StatusCode, MessageId) {
    match err {
        AuthError::Malformed(_) => (StatusCode::BAD_REQUEST, MessageId::BadRequest),
        AuthError::Invalid(_) | AuthError::RotationConflict | AuthError::RotationNotFound => {
            (StatusCode::UNAUTHORIZED, MessageId::Unauthorized)
        }
        AuthError::Expired => match kind {
            TokenKind::Refresh => (StatusCode::EXPECTATION_FAILED, MessageId::Expired),
            TokenKind::Access => (StatusCode::UNAUTHORIZED, MessageId::Expired),
        },
        AuthError::Forbidden => (StatusCode::FORBIDDEN, MessageId::Forbidden),
        AuthError::Unreachable(_) => (StatusCode::SERVICE_UNAVAILABLE, MessageId::Unavailable),
        AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, MessageId::Internal),
    }
}
