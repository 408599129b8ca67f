use crate::application_port::*;
use crate::domain_model::*;
use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, KeyInit, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
    /// HMAC key for deriving rotation keys.
    pub rotation_secret: Vec<u8>,
}

/// Longest lifetime accepted for either credential kind.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::days(3650);

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, lifetime) in [
            ("access", self.access_lifetime),
            ("refresh", self.refresh_lifetime),
        ] {
            if lifetime <= Duration::zero() || lifetime > MAX_TOKEN_LIFETIME {
                anyhow::bail!(
                    "{} token lifetime must be positive and at most {} days, got {}",
                    name,
                    MAX_TOKEN_LIFETIME.num_days(),
                    lifetime
                );
            }
        }
        Ok(())
    }
}

fn expiry(now: DateTime<Utc>, lifetime: Duration) -> Result<i64, AuthError> {
    now.checked_add_signed(lifetime)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| AuthError::Internal(format!("expiry out of range: {} + {}", now, lifetime)))
}

// Claim names are shared with the other services that mint and verify these
// tokens; renaming them breaks interop.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    #[serde(rename = "UID")]
    uid: u64,
    #[serde(rename = "Type")]
    kind: TokenKind,
    #[serde(rename = "Key", default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default)]
    iss: String,
    iat: i64,
    exp: i64,
}

fn ensure_subject(subject_id: SubjectId) -> Result<(), AuthError> {
    if subject_id.is_zero() {
        return Err(AuthError::Invalid("subject id must be non-zero".to_string()));
    }
    Ok(())
}

/// Strictly increasing nanosecond stamps, even when the wall clock stalls.
#[derive(Debug, Default)]
struct NanoClock {
    last: AtomicI64,
}

impl NanoClock {
    fn advance(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_nanos_opt().unwrap_or(i64::MAX);
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(candidate.max(prev.saturating_add(1)))
            })
            .unwrap_or_else(|prev| prev);
        candidate.max(prev.saturating_add(1))
    }
}

pub struct JwtRs256Issuer {
    key: EncodingKey,
    cfg: JwtConfig,
    clock: NanoClock,
}

impl JwtRs256Issuer {
    pub fn from_pem(private_pem: &[u8], cfg: JwtConfig) -> anyhow::Result<Self> {
        cfg.validate()?;
        let key = EncodingKey::from_rsa_pem(private_pem).context("parse RSA private key")?;
        Ok(Self {
            key,
            cfg,
            clock: NanoClock::default(),
        })
    }

    pub fn from_pem_file(path: impl AsRef<Path>, cfg: JwtConfig) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path)
            .with_context(|| format!("read private key {}", path.display()))?;
        Self::from_pem(&pem, cfg)
    }

    pub fn issue_access_token_at(
        &self,
        subject_id: SubjectId,
        issuer: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedCredential, AuthError> {
        ensure_subject(subject_id)?;
        let claims = TokenClaims {
            uid: subject_id.0,
            kind: TokenKind::Access,
            key: None,
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: expiry(now, self.cfg.access_lifetime)?,
        };
        self.sign(&claims)
    }

    pub fn issue_refresh_token_at(
        &self,
        subject_id: SubjectId,
        issuer: &str,
        now: DateTime<Utc>,
    ) -> Result<(SignedCredential, RotationKey), AuthError> {
        ensure_subject(subject_id)?;
        let rotation_key = self.derive_rotation_key(subject_id, self.clock.advance(now))?;
        let claims = TokenClaims {
            uid: subject_id.0,
            kind: TokenKind::Refresh,
            key: Some(rotation_key.0.clone()),
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: expiry(now, self.cfg.refresh_lifetime)?,
        };
        Ok((self.sign(&claims)?, rotation_key))
    }

    fn derive_rotation_key(
        &self,
        subject_id: SubjectId,
        nanos: i64,
    ) -> Result<RotationKey, AuthError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.cfg.rotation_secret)
            .map_err(|e| AuthError::Internal(format!("rotation key: {}", e)))?;
        mac.update(format!("{}:{}", subject_id, nanos).as_bytes());
        let out = mac.finalize().into_bytes();
        Ok(RotationKey(hex::encode(out)))
    }

    fn sign(&self, claims: &TokenClaims) -> Result<SignedCredential, AuthError> {
        encode(&Header::new(Algorithm::RS256), claims, &self.key)
            .map(SignedCredential)
            .map_err(|e| AuthError::Internal(format!("signing: {}", e)))
    }
}

impl TokenIssuer for JwtRs256Issuer {
    fn issue_access_token(
        &self,
        subject_id: SubjectId,
        issuer: &str,
    ) -> Result<SignedCredential, AuthError> {
        self.issue_access_token_at(subject_id, issuer, Utc::now())
    }

    fn issue_refresh_token(
        &self,
        subject_id: SubjectId,
        issuer: &str,
    ) -> Result<(SignedCredential, RotationKey), AuthError> {
        self.issue_refresh_token_at(subject_id, issuer, Utc::now())
    }
}

pub struct JwtRs256Validator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtRs256Validator {
    pub fn from_pem(public_pem: &[u8]) -> anyhow::Result<Self> {
        let key = DecodingKey::from_rsa_pem(public_pem).context("parse RSA public key")?;

        // Only RS256 is accepted; expiry is checked in `validate_at` against
        // the caller's clock so `Expired` can be told apart from `Invalid`.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Ok(Self { key, validation })
    }

    pub fn from_pem_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let pem =
            std::fs::read(path).with_context(|| format!("read public key {}", path.display()))?;
        Self::from_pem(&pem)
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::Invalid(format!("decode: {}", e)))?;
        let claims = data.claims;

        if claims.uid == 0 {
            return Err(AuthError::Invalid("missing subject id".to_string()));
        }
        let rotation_key = match claims.kind {
            TokenKind::Refresh => match claims.key {
                Some(key) if !key.is_empty() => Some(RotationKey(key)),
                _ => return Err(AuthError::Invalid("refresh token without key".to_string())),
            },
            TokenKind::Access => None,
        };

        let issued_at = timestamp(claims.iat)?;
        let expires_at = timestamp(claims.exp)?;
        if now.timestamp() > claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(Claims {
            subject_id: SubjectId(claims.uid),
            kind: claims.kind,
            rotation_key,
            issuer: claims.iss,
            issued_at,
            expires_at,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, AuthError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| AuthError::Invalid(format!("timestamp out of range: {}", secs)))
}

impl TokenValidator for JwtRs256Validator {
    fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now())
    }
}
