use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main configuration structure loaded from access_hub.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// HTTP listener, CORS and request limits
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // 5001 avoids the macOS AirPlay receiver on 5000
            bind: SocketAddr::from(([0, 0, 0, 0], 5001)),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://localhost:8080".to_string(),
            ],
            max_body_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|d| d.join("access-hub").join("access_hub.db"))
            .unwrap_or_else(|| PathBuf::from("access_hub.db"));
        Self { path }
    }
}

/// Identity attached to a configured bearer token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenIdentity {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// token -> identity
    pub tokens: HashMap<String, TokenIdentity>,
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "access_hub=info,tower_http=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn load_from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("ACCESS_HUB_LOG") {
            if !level.trim().is_empty() {
                config.log_level = level;
            }
        }
        config
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses ACCESS_HUB_CONFIG or defaults to "access_hub.toml".
    pub fn load() -> anyhow::Result<Self> {
        load_env_file();

        let config_path =
            std::env::var("ACCESS_HUB_CONFIG").unwrap_or_else(|_| "access_hub.toml".to_string());

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(_) => {
                tracing::warn!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(bind) = std::env::var("ACCESS_HUB_BIND") {
            self.server.bind = bind
                .parse()
                .map_err(|e| anyhow::anyhow!("ACCESS_HUB_BIND '{}' is invalid: {}", bind, e))?;
            tracing::debug!("ACCESS_HUB_BIND env override applied");
        }
        if let Ok(path) = std::env::var("ACCESS_HUB_DB_PATH") {
            self.database.path = PathBuf::from(path);
            tracing::debug!("ACCESS_HUB_DB_PATH env override applied");
        }
        if let Ok(origins) = std::env::var("ACCESS_HUB_CORS_ORIGINS") {
            self.server.cors_origins = parse_origins(&origins);
            tracing::debug!("ACCESS_HUB_CORS_ORIGINS env override applied");
        }
        if let Ok(tokens) = std::env::var("ACCESS_HUB_TOKENS") {
            self.auth.tokens.extend(parse_tokens(&tokens)?);
            tracing::debug!("ACCESS_HUB_TOKENS env override applied");
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.max_body_bytes == 0 {
            anyhow::bail!("server.max_body_bytes must be > 0");
        }
        if self.server.cors_origins.iter().any(|o| o.trim().is_empty()) {
            anyhow::bail!("server.cors_origins must not contain empty entries");
        }
        if self.auth.tokens.is_empty() {
            tracing::warn!("No bearer tokens configured; every authenticated route will return 401");
        }
        for (token, identity) in &self.auth.tokens {
            if token.is_empty() || identity.uid.is_empty() {
                anyhow::bail!("auth.tokens entries need a non-empty token and uid");
            }
        }
        Ok(())
    }
}

/// Load `.env` (or `ACCESS_HUB_ENV_FILE`) into the process environment.
/// Variables that are already set are left alone, so calling this twice is harmless.
pub fn load_env_file() {
    if let Ok(env_path) = std::env::var("ACCESS_HUB_ENV_FILE") {
        let _ = dotenvy::from_path(env_path);
    } else {
        let _ = dotenvy::dotenv();
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `token:uid[:email],...`
pub fn parse_tokens(raw: &str) -> anyhow::Result<HashMap<String, TokenIdentity>> {
    let mut tokens = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut parts = entry.splitn(3, ':');
        let token = parts.next().unwrap_or_default();
        let uid = parts.next().unwrap_or_default();
        if token.is_empty() || uid.is_empty() {
            anyhow::bail!("ACCESS_HUB_TOKENS entry '{}' must be token:uid[:email]", entry);
        }
        let email = parts.next().filter(|e| !e.is_empty()).map(str::to_string);
        tokens.insert(
            token.to_string(),
            TokenIdentity {
                uid: uid.to_string(),
                email,
            },
        );
    }
    Ok(tokens)
}
