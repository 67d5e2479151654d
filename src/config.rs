//! Gateway configuration
//!
//! Layers, lowest to highest precedence: built-in defaults, an optional TOML
//! file, environment variables. The constrained-environment switch for the
//! WhatsApp connector is resolved here once and injected into the connector.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "gateway.toml";

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin123";
const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub whatsapp: WhatsappConfig,
    pub slack: SlackConfig,
    pub throttle: ThrottleConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
    /// Initialize every connector in the background at startup
    pub auto_initialize: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            auto_initialize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub jwt_secret: String,
    /// Token lifetime such as `30s`, `15m`, `1h`, `7d`
    pub jwt_expires_in: String,
    /// API key registered at startup
    pub default_api_key: String,
    pub webhook_secret: String,
    /// Require `X-Webhook-Signature` on the campaign webhook route
    pub require_webhook_signature: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expires_in: "1h".to_string(),
            default_api_key: "webhook-default-key".to_string(),
            webhook_secret: "webhook-secret".to_string(),
            require_webhook_signature: false,
        }
    }
}

impl AuthConfig {
    /// Still running with the shipped login or signing secret?
    pub fn uses_default_secrets(&self) -> bool {
        (self.username == DEFAULT_USERNAME && self.password == DEFAULT_PASSWORD)
            || self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsappConfig {
    /// Persisted session name on the automation bridge
    pub session_name: String,
    /// WebSocket URL of the automation bridge
    pub bridge_url: String,
    /// Constrained mode: never connect, every send fails
    pub disabled: bool,
    /// How long to wait for a bridge reply
    pub request_timeout_secs: u64,
    pub ping_interval_secs: u64,
    /// Whole-request timeout for media downloads
    pub media_timeout_secs: u64,
    /// Largest media body accepted for `send_media`
    pub max_media_bytes: u64,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            session_name: "whatsapp-session".to_string(),
            bridge_url: "ws://127.0.0.1:8085/bridge".to_string(),
            disabled: false,
            request_timeout_secs: 60,
            ping_interval_secs: 30,
            media_timeout_secs: 30,
            max_media_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub bot_token: Option<String>,
    pub api_base_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: "https://slack.com/api/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Window length in milliseconds
    pub ttl_ms: u64,
    /// Requests allowed per client per window
    pub limit: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 60_000,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Upper bound on the status fan-out of a health check
    pub status_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            status_timeout_ms: 5_000,
        }
    }
}

impl GatewayConfig {
    /// Load config from a file (if any) and the process environment
    ///
    /// When `path` is `None`, `gateway.toml` in the working directory is used
    /// if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
            .map_err(|e| Error::configuration(format!("{}: {}", path.display(), e.message)))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::configuration(format!("invalid config: {e}")))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            match v.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %v, "ignoring invalid PORT"),
            }
        }
        if let Some(v) = get("ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(v) = get("AUTO_INITIALIZE") {
            self.server.auto_initialize = parse_bool(&v);
        }

        if let Some(v) = get("AUTH_USERNAME") {
            self.auth.username = v;
        }
        if let Some(v) = get("AUTH_PASSWORD") {
            self.auth.password = v;
        }
        if let Some(v) = get("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get("JWT_EXPIRES_IN") {
            self.auth.jwt_expires_in = v;
        }
        if let Some(v) = get("DEFAULT_API_KEY") {
            self.auth.default_api_key = v;
        }
        if let Some(v) = get("WEBHOOK_SECRET") {
            self.auth.webhook_secret = v;
        }
        if let Some(v) = get("REQUIRE_WEBHOOK_SIGNATURE") {
            self.auth.require_webhook_signature = parse_bool(&v);
        }

        if let Some(v) = get("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(v);
        }
        if let Some(v) = get("SLACK_API_BASE_URL") {
            self.slack.api_base_url = v;
        }

        if let Some(v) = get("WHATSAPP_SESSION_NAME") {
            self.whatsapp.session_name = v;
        }
        if let Some(v) = get("WHATSAPP_BRIDGE_URL") {
            self.whatsapp.bridge_url = v;
        }
        if let Some(v) = get("WHATSAPP_DISABLED") {
            self.whatsapp.disabled = parse_bool(&v);
        }
        if is_constrained_environment(&lookup) {
            self.whatsapp.disabled = true;
        }

        if let Some(v) = get("THROTTLE_TTL") {
            match v.parse() {
                Ok(ttl) => self.throttle.ttl_ms = ttl,
                Err(_) => warn!(value = %v, "ignoring invalid THROTTLE_TTL"),
            }
        }
        if let Some(v) = get("THROTTLE_LIMIT") {
            match v.parse() {
                Ok(limit) => self.throttle.limit = limit,
                Err(_) => warn!(value = %v, "ignoring invalid THROTTLE_LIMIT"),
            }
        }
    }

    /// Copy with every secret replaced, for display
    pub fn redacted(&self) -> Self {
        const HIDDEN: &str = "********";
        let mut copy = self.clone();
        copy.auth.password = HIDDEN.to_string();
        copy.auth.jwt_secret = HIDDEN.to_string();
        copy.auth.default_api_key = HIDDEN.to_string();
        copy.auth.webhook_secret = HIDDEN.to_string();
        if copy.slack.bot_token.is_some() {
            copy.slack.bot_token = Some(HIDDEN.to_string());
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("failed to render config: {e}")))
    }
}

/// Deployment targets where the browser automation runtime cannot run
///
/// `WHATSAPP_DISABLED=true` forces it; otherwise a production Railway
/// deployment is detected from its environment variables.
pub fn is_constrained_environment(lookup: impl Fn(&str) -> Option<String>) -> bool {
    if lookup("WHATSAPP_DISABLED").is_some_and(|v| parse_bool(&v)) {
        return true;
    }
    let production = lookup("NODE_ENV").is_some_and(|v| v == "production");
    let railway = lookup("RAILWAY_ENVIRONMENT").is_some_and(|v| v == "true")
        || lookup("RAILWAY_PROJECT_ID").is_some();
    production && railway
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
