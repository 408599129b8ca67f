use crate::gate::{AuthRejection, FALLBACK_ERROR_MESSAGE};
use serde::Serialize;
use std::convert::Infallible;
use tracing::error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl reject::Reject for AuthRejection {}

fn reply(status: StatusCode, message: impl Into<String>) -> warp::reply::WithStatus<warp::reply::Json> {
    let body = ErrorBody {
        error: message.into(),
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(rejection) = err.find::<AuthRejection>() {
        Ok(reply(rejection.status, rejection.message.clone()))
    } else if err.is_not_found() {
        Ok(reply(StatusCode::NOT_FOUND, "Not found"))
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        Ok(reply(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"))
    } else {
        error!(?err, "unhandled rejection");
        Ok(reply(StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_ERROR_MESSAGE))
    }
}
