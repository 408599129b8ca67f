use super::SignedCredential;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials handed out at sign-in and at every successful rotation.
///
/// The serialized form is what the rotation ledger caches for idempotent
/// retries, so field names are part of the stored format.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionPair {
    pub access: SignedCredential,
    pub refresh: SignedCredential,
}

/// Caller-chosen key identifying one logical refresh attempt.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RequestIdError {
    #[error("request id is empty")]
    Empty,
    #[error("request id collides with the unused marker")]
    Reserved,
}

impl std::str::FromStr for RequestId {
    type Err = RequestIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RequestIdError::Empty);
        }
        if s == RotationState::UNUSED_MARKER {
            return Err(RequestIdError::Reserved);
        }
        Ok(RequestId(s.to_string()))
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RotationState {
    Unused,
    ConsumedBy(RequestId),
}

impl RotationState {
    pub const UNUSED_MARKER: &'static str = "0";

    pub fn encode(&self) -> &str {
        match self {
            RotationState::Unused => Self::UNUSED_MARKER,
            RotationState::ConsumedBy(request_id) => request_id.as_str(),
        }
    }

    pub fn decode(raw: &str) -> Self {
        if raw == Self::UNUSED_MARKER {
            RotationState::Unused
        } else {
            RotationState::ConsumedBy(RequestId(raw.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_rejects_empty_and_marker() {
        assert_eq!("".parse::<RequestId>(), Err(RequestIdError::Empty));
        assert_eq!("  ".parse::<RequestId>(), Err(RequestIdError::Empty));
        assert_eq!("0".parse::<RequestId>(), Err(RequestIdError::Reserved));
        assert_eq!("req-1".parse::<RequestId>().unwrap().as_str(), "req-1");
    }

    #[test]
    fn rotation_state_uses_marker_on_the_wire() {
        assert_eq!(RotationState::Unused.encode(), "0");
        assert_eq!(RotationState::decode("0"), RotationState::Unused);

        let req: RequestId = "req-A".parse().unwrap();
        let consumed = RotationState::decode("req-A");
        assert_eq!(consumed, RotationState::ConsumedBy(req));
        assert_eq!(consumed.encode(), "req-A");
    }

    #[test]
    fn session_pair_serialized_field_names() {
        let pair = SessionPair {
            access: SignedCredential("a.b.c".to_string()),
            refresh: SignedCredential("d.e.f".to_string()),
        };
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"access":"a.b.c","refresh":"d.e.f"}"#);
    }
}
