//! Frames exchanged with the WhatsApp automation bridge

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client to bridge request
#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest<'a> {
    pub seq: i64,
    pub action: &'a str,
    pub data: Value,
}

/// Any frame sent by the bridge: either an event or a reply to a request
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeFrame {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub seq_reply: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl BridgeFrame {
    /// Whether a reply frame reports success
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("OK")
    }
}

/// Session lifecycle events pushed by the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// A pairing code must be scanned
    Qr(String),
    Authenticated { phone: Option<String> },
    Ready { phone: Option<String> },
    AuthFailure(String),
    Disconnected(String),
    /// Incoming message; not processed beyond logging
    Message { from: Option<String>, body: Option<String> },
    Unknown(String),
}

impl BridgeEvent {
    /// Decode an event from its name and payload
    pub fn parse(name: &str, data: &Value) -> Self {
        let field = |key: &str| data.get(key).and_then(|v| v.as_str()).map(String::from);

        match name {
            "qr" => BridgeEvent::Qr(field("qr").or_else(|| data.as_str().map(String::from)).unwrap_or_default()),
            "authenticated" => BridgeEvent::Authenticated { phone: field("phone") },
            "ready" => BridgeEvent::Ready { phone: field("phone") },
            "auth_failure" => BridgeEvent::AuthFailure(
                field("message").unwrap_or_else(|| "authentication failure".to_string()),
            ),
            "disconnected" => BridgeEvent::Disconnected(
                field("reason").unwrap_or_else(|| "disconnected".to_string()),
            ),
            "message" => BridgeEvent::Message {
                from: field("from"),
                body: field("body"),
            },
            other => BridgeEvent::Unknown(other.to_string()),
        }
    }
}

/// Media attached to a `send_media` request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPayload {
    pub mimetype: String,
    /// Base64-encoded content
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}
