use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MessageId {
    BadRequest,
    Unauthorized,
    Expired,
    Forbidden,
    Unavailable,
    Internal,
}

impl MessageId {
    pub const ALL: [MessageId; 6] = [
        MessageId::BadRequest,
        MessageId::Unauthorized,
        MessageId::Expired,
        MessageId::Forbidden,
        MessageId::Unavailable,
        MessageId::Internal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageId::BadRequest => "bad_request",
            MessageId::Unauthorized => "unauthorized",
            MessageId::Expired => "expired",
            MessageId::Forbidden => "forbidden",
            MessageId::Unavailable => "unavailable",
            MessageId::Internal => "internal",
        }
    }
}

impl std::str::FromStr for MessageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown message id {}", s))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LocalizeError {
    #[error("message {id} missing for language {language}")]
    Missing { id: MessageId, language: String },
}

/// Pure lookup from a message id and a client language preference to text.
pub trait Localizer: Send + Sync {
    fn localize(&self, id: MessageId, language: Option<&str>) -> Result<String, LocalizeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_parse_back() {
        for id in MessageId::ALL {
            assert_eq!(id.as_str().parse::<MessageId>().unwrap(), id);
        }
        assert!("Unauthorized".parse::<MessageId>().is_err());
    }
}
