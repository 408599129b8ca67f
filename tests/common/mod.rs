#![allow(dead_code)]

use std::sync::Arc;
use tollgate::application_impl::*;
use tollgate::application_port::*;
use tollgate::gate::AuthGate;
use tollgate::infra_memory::MemoryRotationStore;
use tollgate::server::Server;

pub const PRIVATE_PEM: &[u8] = include_bytes!("../fixtures/private.pem");
pub const PUBLIC_PEM: &[u8] = include_bytes!("../fixtures/public.pem");

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        access_lifetime: chrono::Duration::minutes(15),
        refresh_lifetime: chrono::Duration::days(7),
        rotation_secret: b"integration-secret".to_vec(),
    }
}

pub fn issuer() -> Arc<JwtRs256Issuer> {
    Arc::new(JwtRs256Issuer::from_pem(PRIVATE_PEM, jwt_config()).unwrap())
}

pub fn validator() -> Arc<JwtRs256Validator> {
    Arc::new(JwtRs256Validator::from_pem(PUBLIC_PEM).unwrap())
}

pub fn localizer() -> Arc<CatalogLocalizer> {
    Arc::new(CatalogLocalizer::load_dir("i18n", "en").unwrap())
}

pub fn gate(verifier: Arc<dyn TokenVerifier>) -> Arc<AuthGate> {
    Arc::new(AuthGate::new(verifier, localizer(), "x-platform-lang").unwrap())
}

/// Everything the ledger backend wires, over an in-memory store.
pub struct LedgerStack {
    pub issuer: Arc<JwtRs256Issuer>,
    pub ledger: Arc<RotationLedger>,
    pub sessions: Arc<RealSessionService>,
    pub gate: Arc<AuthGate>,
}

impl LedgerStack {
    pub fn new() -> Self {
        let issuer = issuer();
        let ledger = Arc::new(RotationLedger::new(
            Arc::new(MemoryRotationStore::new()),
            LedgerConfig::default(),
        ));
        let sessions = Arc::new(RealSessionService::new(issuer.clone(), ledger.clone()));
        let gate = gate(Arc::new(LedgerJwtVerifier::new(validator(), ledger.clone())));
        Self {
            issuer,
            ledger,
            sessions,
            gate,
        }
    }

    pub fn server(&self) -> Arc<Server> {
        let sessions: Arc<dyn SessionService> = self.sessions.clone();
        Arc::new(Server::new(self.gate.clone(), Some(sessions)))
    }
}
