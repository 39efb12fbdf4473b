use base64::Engine as _;
use rand::RngCore;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCfg {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbCfg {
    /// e.g. sqlite://members.db or a plain file path
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthCfg {
    /// Base64-encoded 32-byte key used to sign service tokens
    pub token_secret_base64: String,
    /// Fixed expiry window applied to every issued token
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerCfg,
    pub db: DbCfg,
    pub auth: AuthCfg,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_public_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_token_ttl_minutes() -> i64 {
    60
}

impl AppConfig {
    /// Loaded once at startup; the signing key and expiry window are read-only
    /// afterwards. Rotating the key requires a restart and invalidates every
    /// outstanding token.
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("_"))
            .build()?;

        // Map flat env names to the nested structure for convenience
        // APP_BIND_ADDR, APP_PUBLIC_URL, TOKEN_SECRET_BASE64, TOKEN_TTL_MINUTES, DATABASE_URL
        let server = settings.get::<ServerCfg>("server").unwrap_or(ServerCfg {
            bind_addr: std::env::var("APP_BIND_ADDR").unwrap_or_else(|_| default_bind_addr()),
            public_url: std::env::var("APP_PUBLIC_URL").unwrap_or_else(|_| default_public_url()),
        });

        let mut auth = settings.get::<AuthCfg>("auth").unwrap_or(AuthCfg {
            token_secret_base64: std::env::var("TOKEN_SECRET_BASE64").unwrap_or_default(),
            token_ttl_minutes: std::env::var("TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_token_ttl_minutes),
        });
        if auth.token_secret_base64.is_empty() {
            // Generate a dev key and keep it in-memory only
            let mut key = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut key);
            auth.token_secret_base64 = base64::engine::general_purpose::STANDARD.encode(key);
            tracing::warn!(
                "TOKEN_SECRET_BASE64 not provided; generated a temporary dev key. Tokens will be invalidated on restart."
            );
        }

        let db = settings
            .get::<DbCfg>("db")
            .unwrap_or(DbCfg { url: std::env::var("DATABASE_URL")? });

        Ok(AppConfig { server, db, auth })
    }
}

pub fn decode_token_secret(b64: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid TOKEN_SECRET_BASE64: {}", e))?;
    if bytes.len() != 32 {
        return Err(anyhow::anyhow!(
            "TOKEN_SECRET_BASE64 must decode to 32 bytes, got {}",
            bytes.len()
        ));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
