use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::gate::AuthGate;
use crate::infra_grpc::GrpcRemoteAuthority;
use crate::infra_memory::MemoryRotationStore;
use crate::infra_redis::RedisRotationStore;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub gate: Arc<AuthGate>,
    /// Only wired when rotation state is kept locally.
    pub session_service: Option<Arc<dyn SessionService>>,
}

impl Server {
    pub fn new(gate: Arc<AuthGate>, session_service: Option<Arc<dyn SessionService>>) -> Self {
        Self {
            gate,
            session_service,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let localizer: Arc<dyn Localizer> = Arc::new(CatalogLocalizer::load_dir(
            &settings.i18n.dir,
            &settings.i18n.default_language,
        )?);

        let mut session_service: Option<Arc<dyn SessionService>> = None;
        let verifier: Arc<dyn TokenVerifier> = match settings.auth.backend.as_str() {
            "jwt" => Arc::new(LocalJwtVerifier::new(validator(settings)?)),
            "ledger" => {
                let ledger = Arc::new(RotationLedger::new(
                    rotation_store(settings).await?,
                    LedgerConfig {
                        timeout: Duration::from_millis(settings.ledger.timeout_ms),
                        record_ttl: match settings.ledger.rotation_ttl_secs {
                            0 => None,
                            secs => Some(Duration::from_secs(secs)),
                        },
                    },
                ));
                let sessions: Arc<dyn SessionService> =
                    Arc::new(RealSessionService::new(issuer(settings)?, ledger.clone()));
                session_service = Some(sessions);
                Arc::new(LedgerJwtVerifier::new(validator(settings)?, ledger))
            }
            "remote" => {
                let timeout = Duration::from_millis(settings.remote.timeout_ms);
                let authority =
                    GrpcRemoteAuthority::connect_lazy(&settings.remote.endpoint, timeout)?;
                Arc::new(RemoteVerifier::new(Arc::new(authority), timeout))
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let gate = Arc::new(AuthGate::new(
            verifier,
            localizer,
            &settings.i18n.language_header,
        )?);

        info!(backend = %settings.auth.backend, "server started");
        Ok(Self::new(gate, session_service))
    }
}

fn validator(settings: &Settings) -> anyhow::Result<Arc<dyn TokenValidator>> {
    let validator = JwtRs256Validator::from_pem_file(&settings.token.public_key_path)?;
    Ok(Arc::new(validator))
}

fn issuer(settings: &Settings) -> anyhow::Result<Arc<dyn TokenIssuer>> {
    let minutes = |name: &str, value: i64| {
        chrono::Duration::try_minutes(value)
            .ok_or_else(|| anyhow::anyhow!("{} out of range: {}", name, value))
    };
    let cfg = JwtConfig {
        access_lifetime: minutes("access_lifetime_minutes", settings.token.access_lifetime_minutes)?,
        refresh_lifetime: minutes(
            "refresh_lifetime_minutes",
            settings.token.refresh_lifetime_minutes,
        )?,
        rotation_secret: settings.token.rotation_secret.clone().into_bytes(),
    };
    let issuer = JwtRs256Issuer::from_pem_file(&settings.token.private_key_path, cfg)?;
    Ok(Arc::new(issuer))
}

async fn rotation_store(settings: &Settings) -> anyhow::Result<Arc<dyn RotationStore>> {
    match settings.ledger.store.as_str() {
        "memory" => {
            warn!("rotation records are kept in memory and lost on restart");
            Ok(Arc::new(MemoryRotationStore::new()))
        }
        "redis" => {
            let client = redis::Client::open(settings.ledger.redis_dsn.as_str())
                .context("open redis client")?;
            let manager = client
                .get_connection_manager()
                .await
                .context("connect to redis")?;
            Ok(Arc::new(RedisRotationStore::new(
                manager,
                settings.ledger.key_prefix.clone(),
            )))
        }
        other => Err(anyhow::anyhow!("Unknown ledger store: {}", other)),
    }
}
