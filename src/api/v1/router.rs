use super::handler;
use crate::application_port::SessionService;
use crate::domain_model::*;
use crate::gate::AuthGate;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // Paths before methods, so an unmatched path stays a 404 rather than 405.
    let version = warp::path("version")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::version);

    let whoami = warp::path("session")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_identity(server.gate.clone(), TokenKind::Access, None))
        .and_then(handler::whoami);

    let sessions = server.session_service.clone();
    let refresh = warp::path("session")
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_session_service(sessions))
        .and(with_identity(server.gate.clone(), TokenKind::Refresh, None))
        .and(warp::header::headers_cloned())
        .and(with(server.gate.clone()))
        .and_then(
            |sessions: Arc<dyn SessionService>,
             identity: Identity,
             headers: HeaderMap,
             gate: Arc<AuthGate>| {
                handler::refresh_session(identity, headers, gate, sessions)
            },
        );

    version.or(whoami).or(refresh)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Rejects with 404 when the configured backend keeps no rotation state.
fn with_session_service(
    sessions: Option<Arc<dyn SessionService>>,
) -> impl Filter<Extract = (Arc<dyn SessionService>,), Error = warp::Rejection> + Clone {
    warp::any().and_then(move || {
        let sessions = sessions.clone();
        async move { sessions.ok_or_else(reject::not_found) }
    })
}

/// Authenticate the request and hand the verified [`Identity`] downstream.
pub fn with_identity(
    gate: Arc<AuthGate>,
    kind: TokenKind,
    allowed_roles: Option<Vec<RoleId>>,
) -> impl Filter<Extract = (Identity,), Error = warp::Rejection> + Clone {
    let allowed_roles = allowed_roles.map(Arc::<[RoleId]>::from);
    warp::header::headers_cloned().and_then(move |headers: HeaderMap| {
        let gate = gate.clone();
        let allowed_roles = allowed_roles.clone();
        async move {
            gate.authenticate(&headers, kind, allowed_roles.as_deref())
                .await
                .map_err(reject::custom)
        }
    })
}
