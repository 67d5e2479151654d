use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::config::WhatsappConfig;
use crate::error::{Error, ErrorCode, Result};
use crate::platforms::Connector;
use crate::types::{
    ConnectionState, ConnectorCapabilities, ConnectorStatus, MessageKind, MessageRequest,
    MessageResponse, Platform, StatusCell,
};

use super::bridge::{BridgeConnection, BridgeOptions};
use super::media::{fetch_media, MediaLimits};

/// Error reported by every operation in constrained mode
pub const DISABLED_MESSAGE: &str = "WhatsApp service disabled in constrained environment";

const DESTROY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connector driving a WhatsApp Web session through the automation bridge
pub struct WhatsappConnector {
    config: WhatsappConfig,
    /// HTTP client for media downloads
    http_client: Client,
    bridge: RwLock<Option<Arc<BridgeConnection>>>,
    /// Serializes concurrent `initialize` calls
    init_lock: Mutex<()>,
    status: Arc<StatusCell>,
    capabilities: ConnectorCapabilities,
}

impl WhatsappConnector {
    /// Create a new, uninitialized WhatsApp connector
    ///
    /// In constrained mode the connector starts out disabled and stays so.
    pub fn new(config: WhatsappConfig) -> Self {
        let status = StatusCell::new(Platform::Whatsapp);
        if config.disabled {
            status.disabled(DISABLED_MESSAGE);
            status.set_initialized(true);
        }
        Self {
            config,
            http_client: Client::new(),
            bridge: RwLock::new(None),
            init_lock: Mutex::new(()),
            status: Arc::new(status),
            capabilities: ConnectorCapabilities::whatsapp(),
        }
    }

    /// Connect to the bridge and start (or resume) the persisted session
    async fn open_session(&self) -> Result<BridgeConnection> {
        let options = BridgeOptions {
            ping_interval: Duration::from_secs(self.config.ping_interval_secs.max(1)),
            request_timeout: Duration::from_secs(self.config.request_timeout_secs.max(1)),
        };
        let bridge =
            BridgeConnection::connect(&self.config.bridge_url, options, Arc::clone(&self.status)).await?;

        let session = json!({ "session": self.config.session_name });
        if let Err(e) = bridge.request("initialize", session).await {
            bridge.close().await;
            return Err(e);
        }
        Ok(bridge)
    }

    async fn deliver(&self, bridge: &BridgeConnection, request: &MessageRequest) -> Result<String> {
        let chat_id = chat_id(&request.to);

        let reply = if request.kind == MessageKind::Text {
            bridge
                .request("send_message", json!({ "chat_id": chat_id, "body": request.message }))
                .await?
        } else {
            let media_url = request
                .media_url()
                .ok_or_else(|| Error::invalid_argument("Media URL is required for media messages"))?;
            let limits = MediaLimits {
                timeout: Duration::from_secs(self.config.media_timeout_secs.max(1)),
                max_bytes: self.config.max_media_bytes,
            };
            let media =
                fetch_media(&self.http_client, media_url, request.filename.as_deref(), limits).await?;
            bridge
                .request(
                    "send_media",
                    json!({ "chat_id": chat_id, "media": media, "caption": request.caption }),
                )
                .await?
        };

        message_id(&reply)
    }
}

/// WhatsApp chat ID for a destination phone number
pub fn chat_id(to: &str) -> String {
    let to = to.trim();
    if to.contains("@c.us") {
        to.to_string()
    } else {
        format!("{to}@c.us")
    }
}

fn message_id(reply: &Value) -> Result<String> {
    reply
        .get("message_id")
        .and_then(|id| id.as_str())
        .map(String::from)
        .ok_or_else(|| Error::new(ErrorCode::BackendError, "Bridge reply is missing message_id"))
}

#[async_trait]
impl Connector for WhatsappConnector {
    fn platform(&self) -> Platform {
        Platform::Whatsapp
    }

    fn capabilities(&self) -> &ConnectorCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> Result<()> {
        let _guard = self.init_lock.lock().await;
        if self.status.is_initialized() {
            return Ok(());
        }

        if self.config.disabled {
            warn!("{DISABLED_MESSAGE}");
            return Ok(());
        }

        // A bridge left over from a lost session is replaced
        if let Some(stale) = self.bridge.write().await.take() {
            stale.close().await;
        }

        info!(session = %self.config.session_name, bridge = %self.config.bridge_url, "Initializing WhatsApp connector");
        self.status.begin_initializing();

        match self.open_session().await {
            Ok(bridge) => {
                *self.bridge.write().await = Some(Arc::new(bridge));
                // An auth failure or drop may already have been reported by the reader
                if !matches!(self.status.state(), ConnectionState::Failed | ConnectionState::Disconnected) {
                    self.status.set_initialized(true);
                }
                info!("WhatsApp session started, waiting for authentication");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize WhatsApp connector");
                self.status.failed(e.message.clone());
                Err(e.with_platform(Platform::Whatsapp))
            }
        }
    }

    async fn send_message(&self, request: &MessageRequest) -> MessageResponse {
        if let Some(reason) = self.unavailable_reason() {
            return MessageResponse::failure(Platform::Whatsapp, reason);
        }

        let bridge = self.bridge.read().await.clone();
        let bridge = match bridge {
            Some(bridge) if self.status.is_connected() => bridge,
            _ => return MessageResponse::failure(Platform::Whatsapp, "WhatsApp client not connected"),
        };

        match self.deliver(&bridge, request).await {
            Ok(id) => {
                info!(to = %request.to, kind = ?request.kind, message_id = %id, "WhatsApp message sent");
                MessageResponse::sent(Platform::Whatsapp, id)
            }
            Err(e) => {
                error!(to = %request.to, error = %e, "Failed to send WhatsApp message");
                MessageResponse::failure(Platform::Whatsapp, e.message)
            }
        }
    }

    async fn get_status(&self) -> Result<ConnectorStatus> {
        Ok(self.status.snapshot())
    }

    fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    async fn destroy(&self) {
        // Waits out an in-flight initialize so its bridge is torn down too
        let _guard = self.init_lock.lock().await;
        let bridge = self.bridge.write().await.take();
        if let Some(bridge) = bridge {
            match tokio::time::timeout(DESTROY_TIMEOUT, bridge.request("destroy", json!({}))).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "WhatsApp bridge rejected destroy"),
                Err(_) => warn!("WhatsApp bridge did not acknowledge destroy"),
            }
            bridge.close().await;
            info!("WhatsApp connector destroyed");
        }
        if !self.config.disabled {
            self.status.reset();
        }
    }

    fn validate_message(&self, request: &MessageRequest) -> bool {
        if self.config.disabled {
            return false;
        }
        let to = request.to.as_str();
        if to.is_empty() || !to.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        request.has_required_media()
    }

    fn unavailable_reason(&self) -> Option<String> {
        self.config.disabled.then(|| DISABLED_MESSAGE.to_string())
    }

    fn subscribe(&self) -> watch::Receiver<ConnectorStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> WhatsappConfig {
        WhatsappConfig {
            disabled: true,
            ..WhatsappConfig::default()
        }
    }

    #[test]
    fn test_chat_id() {
        assert_eq!(chat_id("15551234567"), "15551234567@c.us");
        assert_eq!(chat_id("15551234567@c.us"), "15551234567@c.us");
    }

    #[test]
    fn test_message_id_from_reply() {
        assert_eq!(message_id(&json!({"message_id": "ABC"})).unwrap(), "ABC");
        assert_eq!(
            message_id(&json!({})).unwrap_err().code,
            ErrorCode::BackendError
        );
    }

    #[test]
    fn test_validate_message() {
        let connector = WhatsappConnector::new(WhatsappConfig::default());
        let ok = MessageRequest::text(Platform::Whatsapp, "1234567890", "hi");
        assert!(connector.validate_message(&ok));

        for to in ["", "+1234567890", "12345abc", "#general", " 1234567890 ", "1234567890\n"] {
            let req = MessageRequest::text(Platform::Whatsapp, to, "hi");
            assert!(!connector.validate_message(&req), "{to}");
        }

        let mut image = ok.clone();
        image.kind = MessageKind::Image;
        assert!(!connector.validate_message(&image));
        let image = image.with_media(MessageKind::Image, "https://example.com/a.png");
        assert!(connector.validate_message(&image));
    }

    #[tokio::test]
    async fn test_constrained_mode() {
        let connector = WhatsappConnector::new(disabled_config());
        connector.initialize().await.unwrap();

        let status = connector.get_status().await.unwrap();
        assert_eq!(status.state, ConnectionState::Disabled);
        assert!(!status.is_connected);
        assert_eq!(status.error.as_deref(), Some(DISABLED_MESSAGE));
        assert!(!connector.is_ready());

        let request = MessageRequest::text(Platform::Whatsapp, "1234567890", "hi");
        assert!(!connector.validate_message(&request));
        assert_eq!(connector.unavailable_reason().as_deref(), Some(DISABLED_MESSAGE));

        let response = connector.send_message(&request).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("disabled"));

        connector.destroy().await;
        assert_eq!(connector.get_status().await.unwrap().state, ConnectionState::Disabled);
    }

    #[tokio::test]
    async fn test_send_before_initialize() {
        let connector = WhatsappConnector::new(WhatsappConfig::default());
        let response = connector
            .send_message(&MessageRequest::text(Platform::Whatsapp, "1234567890", "hi"))
            .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("WhatsApp client not connected"));
    }

    #[tokio::test]
    async fn test_unreachable_bridge_fails_initialize() {
        let connector = WhatsappConnector::new(WhatsappConfig {
            bridge_url: "ws://127.0.0.1:1/bridge".to_string(),
            ..WhatsappConfig::default()
        });
        let err = connector.initialize().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert_eq!(err.platform(), Some(Platform::Whatsapp));

        let status = connector.get_status().await.unwrap();
        assert_eq!(status.state, ConnectionState::Failed);
        assert!(status.error.is_some());
    }
}
