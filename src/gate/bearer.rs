use crate::application_port::AuthError;
use warp::http::HeaderMap;
use warp::http::header::AUTHORIZATION;

/// Split `Bearer <token>` on a single space. Anything but exactly two parts
/// with a case-insensitive `bearer` scheme and a non-empty token is malformed.
pub fn parse_bearer(value: &str) -> Result<&str, AuthError> {
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(*token)
        }
        [_, _] => Err(AuthError::Malformed("expected bearer scheme".to_string())),
        _ => Err(AuthError::Malformed(format!(
            "expected 2 space-separated parts, got {}",
            parts.len()
        ))),
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::Malformed("missing authorization header".to_string()))?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::Malformed("authorization header is not ascii".to_string()))?;
    parse_bearer(value)
}
