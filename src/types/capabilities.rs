//! Connector capabilities
//!
//! Describes how each connector encodes the different message kinds, so API
//! consumers can tell which media arrive natively and which degrade to a link.

use serde::{Deserialize, Serialize};

use super::message::{MessageKind, Platform};

/// Connector capabilities and feature flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorCapabilities {
    /// Platform this connector serves
    pub platform: Platform,

    /// Does connecting require an out-of-band pairing code?
    pub requires_pairing: bool,

    /// Kinds delivered as native media/attachments
    pub native_media: Vec<MessageKind>,

    /// Kinds delivered as a text message containing a link
    pub link_fallback: Vec<MessageKind>,

    /// Accepted destination format
    pub destination_hint: String,
}

impl ConnectorCapabilities {
    /// Capabilities of the WhatsApp automation connector
    pub fn whatsapp() -> Self {
        ConnectorCapabilities {
            platform: Platform::Whatsapp,
            requires_pairing: true,
            native_media: vec![
                MessageKind::Image,
                MessageKind::Document,
                MessageKind::Audio,
                MessageKind::Video,
            ],
            link_fallback: Vec::new(),
            destination_hint: "phone number, digits only (e.g. 1234567890)".to_string(),
        }
    }

    /// Capabilities of the Slack Web API connector
    pub fn slack() -> Self {
        ConnectorCapabilities {
            platform: Platform::Slack,
            requires_pairing: false,
            native_media: vec![MessageKind::Image],
            link_fallback: vec![MessageKind::Document, MessageKind::Audio, MessageKind::Video],
            destination_hint: "channel or user: #name, @name, C… or U… ID".to_string(),
        }
    }

    /// Is this kind delivered natively?
    pub fn is_native(&self, kind: MessageKind) -> bool {
        kind == MessageKind::Text || self.native_media.contains(&kind)
    }
}
