use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub token: Token,
    pub ledger: Ledger,
    pub remote: Remote,
    pub i18n: I18n,
    pub http: Http,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "jwt", "ledger" or "remote"
}

#[derive(Deserialize)]
pub struct Token {
    pub private_key_path: String,
    pub public_key_path: String,
    pub access_lifetime_minutes: i64,
    pub refresh_lifetime_minutes: i64,
    pub rotation_secret: String,
}

// Keep the rotation secret out of startup logs.
impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("private_key_path", &self.private_key_path)
            .field("public_key_path", &self.public_key_path)
            .field("access_lifetime_minutes", &self.access_lifetime_minutes)
            .field("refresh_lifetime_minutes", &self.refresh_lifetime_minutes)
            .field("rotation_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    pub store: String, // "redis" or "memory"
    pub redis_dsn: String,
    #[serde(default)]
    pub key_prefix: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub rotation_ttl_secs: u64, // 0 = no expiry
}

#[derive(Debug, Deserialize)]
pub struct Remote {
    pub endpoint: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct I18n {
    pub dir: String,
    pub default_language: String,
    pub language_header: String,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub cert_path: String,
    #[serde(default)]
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
