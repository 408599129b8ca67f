use crate::application_port::*;
use crate::domain_model::*;
use crate::gate::AuthGate;
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::reject;

pub const REQUEST_KEY_HEADER: &str = "x-request-key";

pub async fn version() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&env!("CARGO_PKG_VERSION")))
}

pub async fn whoami(identity: Identity) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&identity))
}

pub async fn refresh_session(
    identity: Identity,
    headers: HeaderMap,
    gate: Arc<AuthGate>,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let reject_with = |err: AuthError| reject::custom(gate.reject_error(err, TokenKind::Refresh, &headers));

    let request_id = headers
        .get(REQUEST_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AuthError::Malformed(format!("missing {} header", REQUEST_KEY_HEADER)))
        .and_then(|raw| {
            raw.parse::<RequestId>()
                .map_err(|e| AuthError::Malformed(e.to_string()))
        })
        .map_err(reject_with)?;

    let pair = session_service
        .refresh_session(&identity, &request_id)
        .await
        .map_err(reject_with)?;
    Ok(warp::reply::json(&pair))
}
