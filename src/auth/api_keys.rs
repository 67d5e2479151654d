//! In-memory API key store

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Prefix of generated keys
pub const API_KEY_PREFIX: &str = "mp_";
/// Requests per hour advertised for every key
const DEFAULT_RATE_LIMIT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInfo {
    pub key: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub rate_limit: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl ApiKeyInfo {
    fn new(key: String, name: impl Into<String>, permissions: Vec<String>) -> Self {
        ApiKeyInfo {
            key,
            name: name.into(),
            permissions,
            rate_limit: DEFAULT_RATE_LIMIT,
            is_active: true,
            created_at: Utc::now(),
            last_used: None,
        }
    }
}

/// API keys keyed by their value; revoked keys stay listed as inactive
pub struct ApiKeyStore {
    keys: RwLock<HashMap<String, ApiKeyInfo>>,
}

impl ApiKeyStore {
    /// Store seeded with the default webhook key
    pub fn new(default_key: &str) -> Self {
        let mut keys = HashMap::new();
        keys.insert(
            default_key.to_string(),
            ApiKeyInfo::new(
                default_key.to_string(),
                "Default Webhook Key",
                vec!["webhook".to_string()],
            ),
        );
        Self {
            keys: RwLock::new(keys),
        }
    }

    /// Look up an active key and stamp its last use
    pub async fn validate(&self, key: &str) -> Option<ApiKeyInfo> {
        let mut keys = self.keys.write().await;
        let info = keys.get_mut(key).filter(|info| info.is_active)?;
        info.last_used = Some(Utc::now());
        Some(info.clone())
    }

    /// Generate and register a new key
    ///
    /// Permissions default to `["webhook"]`.
    pub async fn create(&self, name: &str, permissions: Option<Vec<String>>) -> ApiKeyInfo {
        let permissions = permissions.unwrap_or_else(|| vec!["webhook".to_string()]);
        let info = ApiKeyInfo::new(generate_api_key(), name, permissions);
        self.keys.write().await.insert(info.key.clone(), info.clone());
        info!(name, "API key created");
        info
    }

    /// Deactivate a key; false when the key is unknown
    pub async fn revoke(&self, key: &str) -> bool {
        match self.keys.write().await.get_mut(key) {
            Some(info) => {
                info.is_active = false;
                info!(name = %info.name, "API key revoked");
                true
            }
            None => false,
        }
    }

    /// Every key, oldest first
    pub async fn list(&self) -> Vec<ApiKeyInfo> {
        let mut keys: Vec<ApiKeyInfo> = self.keys.read().await.values().cloned().collect();
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        keys
    }
}

/// `mp_` followed by 32 random bytes in hex
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    format!("{API_KEY_PREFIX}{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with("mp_"));
        assert_eq!(key.len(), 3 + 64);
        assert!(key[3..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }

    #[tokio::test]
    async fn test_default_key_is_valid_and_stamped() {
        let store = ApiKeyStore::new("webhook-default-key");
        let info = store.validate("webhook-default-key").await.unwrap();
        assert_eq!(info.name, "Default Webhook Key");
        assert_eq!(info.permissions, vec!["webhook".to_string()]);
        assert!(info.last_used.is_some());
        assert!(store.validate("unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_create_and_revoke() {
        let store = ApiKeyStore::new("default");
        let created = store.create("ci", None).await;
        assert!(created.is_active);
        assert_eq!(created.rate_limit, 1000);
        assert!(store.validate(&created.key).await.is_some());

        assert!(store.revoke(&created.key).await);
        assert!(store.validate(&created.key).await.is_none());
        assert!(!store.revoke("missing").await);

        let listed = store.list().await;
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|k| k.key == created.key && !k.is_active));
    }

    #[tokio::test]
    async fn test_create_with_permissions() {
        let store = ApiKeyStore::new("default");
        let created = store
            .create("ops", Some(vec!["webhook".into(), "admin".into()]))
            .await;
        assert_eq!(created.permissions.len(), 2);

        let value = serde_json::to_value(&created).unwrap();
        assert_eq!(value["isActive"], true);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("lastUsed").is_none());
    }
}
