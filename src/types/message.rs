//! Message types shared by every connector

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current time as an ISO-8601 UTC string with millisecond precision
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Supported messaging platforms
///
/// The set is closed: adding a platform means adding a variant and a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser-automation driven WhatsApp Web client
    Whatsapp,
    /// Slack Web API client
    Slack,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Whatsapp, Platform::Slack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Whatsapp => "whatsapp",
            Platform::Slack => "slack",
        }
    }

    /// Human-readable name, used in rendered message bodies
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Whatsapp => "WhatsApp",
            Platform::Slack => "Slack",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Platform::Whatsapp),
            "slack" => Ok(Platform::Slack),
            other => Err(Error::invalid_argument(format!(
                "Unknown platform '{other}', expected one of: whatsapp, slack"
            ))),
        }
    }
}

/// Kind of content carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Document,
    Audio,
    Video,
}

impl MessageKind {
    /// Every kind except text must carry a media URL
    pub fn requires_media(&self) -> bool {
        !matches!(self, MessageKind::Text)
    }
}

/// A normalized send request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    /// Destination: phone number for WhatsApp, channel/user ID for Slack
    pub to: String,
    /// Message body text
    pub message: String,
    /// Target platform
    pub platform: Platform,
    /// Message kind (defaults to text)
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Media URL, required for non-text kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Caption for media messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Filename for document messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl MessageRequest {
    /// Create a text message request
    pub fn text(platform: Platform, to: impl Into<String>, message: impl Into<String>) -> Self {
        MessageRequest {
            to: to.into(),
            message: message.into(),
            platform,
            kind: MessageKind::Text,
            media_url: None,
            caption: None,
            filename: None,
        }
    }

    /// Turn this request into a media request of the given kind
    pub fn with_media(mut self, kind: MessageKind, media_url: impl Into<String>) -> Self {
        self.kind = kind;
        self.media_url = Some(media_url.into());
        self
    }

    /// Set caption
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Media URL, treating an empty string as absent
    pub fn media_url(&self) -> Option<&str> {
        self.media_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Structural check shared by every platform: non-text kinds carry media
    pub fn has_required_media(&self) -> bool {
        !self.kind.requires_media() || self.media_url().is_some()
    }
}

/// Uniform outcome of a send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
    pub platform: Platform,
}

impl MessageResponse {
    /// Successful send with the backend-assigned message ID
    pub fn sent(platform: Platform, message_id: impl Into<String>) -> Self {
        MessageResponse {
            success: true,
            message_id: Some(message_id.into()),
            message: Some("Message sent successfully".to_string()),
            error: None,
            timestamp: timestamp_now(),
            platform,
        }
    }

    /// Failed send
    pub fn failure(platform: Platform, error: impl Into<String>) -> Self {
        MessageResponse {
            success: false,
            message_id: None,
            message: None,
            error: Some(error.into()),
            timestamp: timestamp_now(),
            platform,
        }
    }
}
