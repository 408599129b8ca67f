use crate::application_port::*;
use crate::domain_model::*;
use std::collections::HashMap;
use std::time::Duration;

/// Scripted authority for tests and local development.
///
/// Unknown tokens are `Invalid`; tokens registered with `with_error` fail with
/// that error instead.
#[derive(Debug, Default)]
pub struct FakeRemoteAuthority {
    grants: HashMap<String, (TokenKind, AuthorityGrant)>,
    errors: HashMap<String, AuthError>,
    delay: Option<Duration>,
}

impl FakeRemoteAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grant(mut self, token: &str, kind: TokenKind, grant: AuthorityGrant) -> Self {
        self.grants.insert(token.to_string(), (kind, grant));
        self
    }

    pub fn with_error(mut self, token: &str, error: AuthError) -> Self {
        self.errors.insert(token.to_string(), error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl RemoteAuthority for FakeRemoteAuthority {
    async fn check(&self, token: &str, kind: TokenKind) -> Result<AuthorityGrant, AuthError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.errors.get(token) {
            return Err(error.clone());
        }
        match self.grants.get(token) {
            Some((granted, grant)) if *granted == kind => Ok(grant.clone()),
            Some((granted, _)) => Err(AuthError::kind_mismatch(kind, *granted)),
            None => Err(AuthError::Invalid("unknown token".to_string())),
        }
    }
}
