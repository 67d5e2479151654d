//! Authentication: admin login with JWTs, API keys for senders, and webhook
//! payload signatures

mod api_keys;
mod jwt;
mod signature;

pub use api_keys::{generate_api_key, ApiKeyInfo, ApiKeyStore, API_KEY_PREFIX};
pub use jwt::{parse_expiration, Claims, JwtKeys};
pub use signature::{compute_signature, verify_signature};

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Authenticated administrator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthUser {
    pub id: u64,
    pub username: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Body of a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

pub struct AuthService {
    config: AuthConfig,
    jwt: JwtKeys,
    api_keys: ApiKeyStore,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        if config.uses_default_secrets() {
            warn!("Using default credentials or secrets; set AUTH_PASSWORD and JWT_SECRET in production");
        }
        let jwt = JwtKeys::new(&config.jwt_secret, &config.jwt_expires_in);
        let api_keys = ApiKeyStore::new(&config.default_api_key);
        Self { config, jwt, api_keys }
    }

    pub fn api_keys(&self) -> &ApiKeyStore {
        &self.api_keys
    }

    /// Whether the listmonk webhook must carry a valid signature
    pub fn requires_webhook_signature(&self) -> bool {
        self.config.require_webhook_signature
    }

    /// Check the configured admin credentials
    pub fn validate_user(&self, username: &str, password: &str) -> Option<AuthUser> {
        let username_ok: bool = username.as_bytes().ct_eq(self.config.username.as_bytes()).into();
        let password_ok: bool = password.as_bytes().ct_eq(self.config.password.as_bytes()).into();
        if !(username_ok && password_ok) {
            return None;
        }
        Some(AuthUser {
            id: 1,
            username: username.to_string(),
            roles: vec!["admin".to_string()],
            permissions: vec!["read".to_string(), "write".to_string(), "admin".to_string()],
        })
    }

    /// Exchange credentials for a bearer token
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let Some(user) = self.validate_user(username, password) else {
            warn!(username, "Rejected login");
            return Err(Error::unauthorized("Invalid credentials"));
        };

        let claims = self.jwt.claims_for(
            &user.id.to_string(),
            &user.username,
            user.roles,
            user.permissions,
        );
        let access_token = self.jwt.encode(&claims)?;
        info!(username, "User logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expires_in(),
        })
    }

    /// Claims of a valid, unexpired token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.jwt.decode(token)
    }

    /// Check a webhook body against its `X-Webhook-Signature`
    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        verify_signature(&self.config.webhook_secret, body, signature)
    }
}
