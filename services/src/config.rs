use serde::Deserialize;
use std::env::vars;
use std::fmt::Display;
use tracing::{info, warn};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
/// Base64 photos travel inside JSON bodies, so the limit is well above axum's 2MB default.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Env {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "test")]
    Test,
    #[serde(rename = "prod")]
    Prod,
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Env::Local => write!(f, "local"),
            Env::Test => write!(f, "test"),
            Env::Prod => write!(f, "prod"),
        }
    }
}

/// How callers of `/api/nano-banana/*` prove they may spend model credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyAuth {
    /// No check. Only sensible behind another gateway or on a laptop.
    Open,
    /// A shared key sent as `Authorization: Bearer <key>`.
    ApiKey(String),
    /// A Supabase session token signed with the project's JWT secret (HS256).
    SupabaseJwt { secret: String },
}

// The final, validated configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    env: Env,
    server_addr: String,
    port: u16,
    gemini_api_key: Option<String>,
    gemini_image_model: String,
    gemini_text_model: String,
    gemini_base_url: String,
    body_limit_bytes: usize,
    proxy_auth: ProxyAuth,
}

// Everything optional here; defaults depend on `env` and are applied in `from_raw`.
#[derive(Deserialize)]
struct RawConfig {
    env: Env,
    server_addr: Option<String>,
    port: Option<u16>,
    gemini_api_key: Option<String>,
    gemini_image_model: Option<String>,
    gemini_text_model: Option<String>,
    gemini_base_url: Option<String>,
    body_limit_bytes: Option<usize>,
    proxy_api_key: Option<String>,
    supabase_jwt_secret: Option<String>,
}

impl Config {
    /// Create a test configuration pointing Gemini at `gemini_base_url`.
    ///
    /// Used by unit and integration tests; never by the binary.
    pub fn new_for_test(gemini_base_url: impl Into<String>) -> Self {
        Self {
            env: Env::Test,
            server_addr: "127.0.0.1".to_owned(),
            port: 3000,
            gemini_api_key: Some("test-gemini-key".to_owned()),
            gemini_image_model: DEFAULT_IMAGE_MODEL.to_owned(),
            gemini_text_model: DEFAULT_TEXT_MODEL.to_owned(),
            gemini_base_url: gemini_base_url.into(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            proxy_auth: ProxyAuth::Open,
        }
    }

    pub fn with_proxy_auth(mut self, proxy_auth: ProxyAuth) -> Self {
        self.proxy_auth = proxy_auth;
        self
    }

    pub fn with_body_limit(mut self, body_limit_bytes: usize) -> Self {
        self.body_limit_bytes = body_limit_bytes;
        self
    }

    pub fn environment(&self) -> &Env {
        &self.env
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_local(&self) -> bool {
        matches!(self.env, Env::Local)
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini_api_key.as_deref()
    }

    pub fn gemini_image_model(&self) -> &str {
        &self.gemini_image_model
    }

    pub fn gemini_text_model(&self) -> &str {
        &self.gemini_text_model
    }

    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_bytes
    }

    pub fn proxy_auth(&self) -> &ProxyAuth {
        &self.proxy_auth
    }

    /// Initializes configuration by reading from environment variables
    /// and applying environment-aware defaults.
    pub fn init() -> anyhow::Result<Self> {
        info!("Loading configuration from environment variables");

        let raw_config: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw_config)
    }

    fn from_raw(raw_config: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            env,
            server_addr,
            port,
            gemini_api_key,
            gemini_image_model,
            gemini_text_model,
            gemini_base_url,
            body_limit_bytes,
            proxy_api_key,
            supabase_jwt_secret,
        } = raw_config;

        let server_addr = match server_addr {
            Some(addr) => {
                info!("Using provided SERVER_ADDR: {}", addr);
                addr
            }
            None => {
                let default_addr = match env {
                    Env::Local => "127.0.0.1",
                    _ => "0.0.0.0",
                };
                info!(
                    "SERVER_ADDR not set, defaulting to {} for {} environment",
                    default_addr, env
                );
                default_addr.to_owned()
            }
        };

        let port = match port {
            Some(port) => port,
            None if matches!(env, Env::Local | Env::Test) => {
                info!("PORT not set, defaulting to 3000 for {} environment", env);
                3000
            }
            None => anyhow::bail!("PORT must be set for {} environment", env),
        };

        let gemini_api_key = gemini_api_key.filter(|key| !key.trim().is_empty());
        match (&gemini_api_key, &env) {
            (Some(_), _) => {}
            (None, Env::Local | Env::Test) => {
                warn!("GEMINI_API_KEY not set, generation requests will fail");
            }
            (None, _) => anyhow::bail!("GEMINI_API_KEY must be set for {} environment", env),
        }

        let proxy_auth = match (
            proxy_api_key.filter(|key| !key.is_empty()),
            supabase_jwt_secret.filter(|secret| !secret.is_empty()),
        ) {
            (Some(_), Some(_)) => {
                anyhow::bail!("Set only one of PROXY_API_KEY and SUPABASE_JWT_SECRET")
            }
            (Some(key), None) => ProxyAuth::ApiKey(key),
            (None, Some(secret)) => ProxyAuth::SupabaseJwt { secret },
            (None, None) => {
                if !matches!(env, Env::Local | Env::Test) {
                    warn!("No proxy authentication configured for {} environment", env);
                }
                ProxyAuth::Open
            }
        };

        Ok(Config {
            env,
            server_addr,
            port,
            gemini_api_key,
            gemini_image_model: gemini_image_model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_owned()),
            gemini_text_model: gemini_text_model.unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_owned()),
            gemini_base_url: gemini_base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_owned()),
            body_limit_bytes: body_limit_bytes.unwrap_or(DEFAULT_BODY_LIMIT_BYTES),
            proxy_auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn local_defaults_apply() {
        let raw: RawConfig =
            from_iter(vec![("ENV", "local")]).expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("local config should build");
        assert_eq!(config.server_addr(), "127.0.0.1");
        assert_eq!(config.port(), 3000);
        assert_eq!(config.gemini_image_model(), "gemini-2.5-flash-image");
        assert_eq!(config.gemini_text_model(), "gemini-2.5-flash");
        assert_eq!(config.gemini_base_url(), DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.body_limit_bytes(), 20 * 1024 * 1024);
        assert!(config.gemini_api_key().is_none());
        assert_eq!(config.proxy_auth(), &ProxyAuth::Open);
    }

    #[test]
    fn prod_requires_gemini_key() {
        let raw: RawConfig = from_iter(vec![("ENV", "prod"), ("PORT", "8080")])
            .expect("RawConfig should deserialize");

        let result = Config::from_raw(raw);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn prod_requires_port() {
        let raw: RawConfig = from_iter(vec![("ENV", "prod"), ("GEMINI_API_KEY", "k")])
            .expect("RawConfig should deserialize");

        let result = Config::from_raw(raw);
        assert!(result.unwrap_err().to_string().contains("PORT"));
    }

    #[test]
    fn prod_binds_public_address() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "prod"),
            ("PORT", "8080"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_BASE_URL", "https://gemini.example/"),
            ("GEMINI_IMAGE_MODEL", "custom-image"),
        ])
        .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("prod config should build");
        assert_eq!(config.server_addr(), "0.0.0.0");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.gemini_api_key(), Some("secret"));
        assert_eq!(config.gemini_base_url(), "https://gemini.example");
        assert_eq!(config.gemini_image_model(), "custom-image");
    }

    #[test]
    fn proxy_auth_from_api_key() {
        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("PROXY_API_KEY", "shared")])
            .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("config should build");
        assert_eq!(config.proxy_auth(), &ProxyAuth::ApiKey("shared".to_owned()));
    }

    #[test]
    fn proxy_auth_modes_are_exclusive() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "local"),
            ("PROXY_API_KEY", "shared"),
            ("SUPABASE_JWT_SECRET", "jwt"),
        ])
        .expect("RawConfig should deserialize");

        assert!(Config::from_raw(raw).is_err());
    }
}
