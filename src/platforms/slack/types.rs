//! Slack Web API request and response types

use serde::{Deserialize, Serialize};

/// Response of `auth.test`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTestResponse {
    #[serde(default)]
    pub url: Option<String>,
    /// Workspace name
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

/// Body of `chat.postMessage`
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
}

impl PostMessageRequest {
    pub fn text(channel: impl Into<String>, text: impl Into<String>) -> Self {
        PostMessageRequest {
            channel: channel.into(),
            text: Some(text.into()),
            blocks: None,
        }
    }

    /// Block layout message; `fallback` is shown in notifications
    pub fn blocks(channel: impl Into<String>, blocks: Vec<Block>, fallback: impl Into<String>) -> Self {
        PostMessageRequest {
            channel: channel.into(),
            text: Some(fallback.into()),
            blocks: Some(blocks),
        }
    }
}

/// Response of `chat.postMessage`
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    #[serde(default)]
    pub channel: Option<String>,
    /// Message timestamp, Slack's message identifier
    pub ts: String,
}

/// Block Kit layout block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
    Image { image_url: String, alt_text: String },
}

/// Block Kit text object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        TextObject {
            kind: "mrkdwn".to_string(),
            text: text.into(),
        }
    }
}
