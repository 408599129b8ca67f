use super::proto::{CHECK_V1_PATH, CheckReqV1, CheckRespV1};
use crate::application_port::*;
use crate::domain_model::*;
use anyhow::Context;
use std::time::Duration;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, warn};

/// Delegates token checks to the central auth service over gRPC.
///
/// The channel connects lazily and reconnects on its own, so one instance is
/// built at startup and shared.
#[derive(Debug, Clone)]
pub struct GrpcRemoteAuthority {
    channel: Channel,
}

impl GrpcRemoteAuthority {
    pub fn connect_lazy(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let channel = Endpoint::from_shared(endpoint.to_string())
            .with_context(|| format!("invalid authority endpoint {}", endpoint))?
            .connect_timeout(timeout)
            .timeout(timeout)
            .connect_lazy();
        Ok(Self { channel })
    }
}

fn map_status(status: &Status) -> AuthError {
    match status.code() {
        Code::DeadlineExceeded | Code::Unavailable | Code::Cancelled => {
            warn!(code = ?status.code(), message = status.message(), "auth service unreachable");
            AuthError::Unreachable(status.message().to_string())
        }
        _ if status.message().contains("expired") => AuthError::Expired,
        code => AuthError::Invalid(format!("{:?}: {}", code, status.message())),
    }
}

fn grant_from_response(resp: CheckRespV1) -> Result<AuthorityGrant, AuthError> {
    if resp.uid == 0 {
        return Err(AuthError::Invalid("authority returned uid 0".to_string()));
    }
    Ok(AuthorityGrant {
        subject_id: SubjectId(resp.uid),
        role_id: RoleId(resp.rid),
        rotation_key: (!resp.key.is_empty()).then(|| RotationKey(resp.key)),
    })
}

#[async_trait::async_trait]
impl RemoteAuthority for GrpcRemoteAuthority {
    async fn check(&self, token: &str, kind: TokenKind) -> Result<AuthorityGrant, AuthError> {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(|e| {
            warn!(error = %e, "auth service connection failed");
            AuthError::Unreachable(e.to_string())
        })?;

        let request = tonic::Request::new(CheckReqV1 {
            token: token.to_string(),
            r#type: kind.as_str().to_string(),
        });
        let codec: ProstCodec<CheckReqV1, CheckRespV1> = ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(CHECK_V1_PATH), codec)
            .await
            .map_err(|status| map_status(&status))?;

        let grant = grant_from_response(response.into_inner())?;
        debug!(subject_id = %grant.subject_id, role_id = %grant.role_id, "authority accepted token");
        Ok(grant)
    }
}
