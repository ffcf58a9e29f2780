use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ShimError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub server: ServerConfig,
    pub models: ModelConfig,
}

/// Upstream OpenClaw gateway that chat requests are forwarded to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:18789".to_string(),
            token: String::new(),
            timeout_secs: 300,
        }
    }
}

impl GatewayConfig {
    pub fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When non-empty, chat requests must present it as a bearer token.
    pub static_api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18790,
            static_api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub default_model: String,
    pub keywords_enabled: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: "openclaw:main".to_string(),
            keywords_enabled: true,
        }
    }
}

impl Settings {
    /// Loads `.env`, then an optional TOML file, then environment overrides.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to read .env: {}", e);
            }
        }

        let mut settings = match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path);
                Self::from_file(&path)?
            }
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: Settings = toml::from_str(&content)?;
        settings.normalize();
        Ok(settings)
    }

    /// Applies `OPENCLAW_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPENCLAW_GATEWAY_URL") {
            self.gateway.base_url = v;
        }
        if let Some(v) = lookup("OPENCLAW_GATEWAY_TOKEN") {
            self.gateway.token = v;
        }
        if let Some(v) = lookup("OPENCLAW_PROXY_TIMEOUT_SECS") {
            self.gateway.timeout_secs = parse_number("OPENCLAW_PROXY_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("OPENCLAW_PROXY_STATIC_API_KEY") {
            self.server.static_api_key = v;
        }
        if let Some(v) = lookup("OPENCLAW_PROXY_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("OPENCLAW_PROXY_PORT") {
            self.server.port = parse_number("OPENCLAW_PROXY_PORT", &v)?;
        }
        if let Some(v) = lookup("OPENCLAW_PROXY_MODEL_ID") {
            self.models.default_model = v;
        }
        if let Some(v) = lookup("OPENCLAW_PROXY_KEYWORDS") {
            self.models.keywords_enabled = parse_flag("OPENCLAW_PROXY_KEYWORDS", &v)?;
        }
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        let trimmed = self.gateway.base_url.trim_end_matches('/').to_string();
        self.gateway.base_url = trimmed;
        self.server.static_api_key = self.server.static_api_key.trim().to_string();
    }

    fn find_config_file() -> Option<String> {
        let possible_names = ["custom-config.toml", "config.toml"];

        possible_names
            .iter()
            .find(|name| Path::new(name).exists())
            .map(|name| name.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ShimError::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ShimError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}
