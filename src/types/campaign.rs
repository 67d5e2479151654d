//! Campaign webhook payload (Listmonk messenger format)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::message::Platform;

/// Payload posted by a Listmonk campaign messenger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignWebhook {
    /// Sender-assigned message ID
    pub id: String,
    pub campaign_id: String,
    /// Subscriber email
    pub email: String,
    /// Subscriber name
    #[serde(default)]
    pub name: String,
    pub subject: String,
    /// HTML body
    #[serde(default)]
    pub body: String,
    /// Plain-text body
    #[serde(default)]
    pub text: String,
    /// Phone number for WhatsApp delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Slack channel for Slack delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Platform discriminator
    #[serde(rename = "type")]
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listmonk_payload() {
        let json = r#"{
            "id": "msg_1",
            "campaign_id": "camp_1",
            "email": "user@example.com",
            "name": "John Doe",
            "subject": "S",
            "body": "<p>T</p>",
            "text": "T",
            "phone": "5551234567",
            "type": "whatsapp",
            "meta": {"list_id": "list_123"}
        }"#;
        let hook: CampaignWebhook = serde_json::from_str(json).unwrap();
        assert_eq!(hook.platform, Platform::Whatsapp);
        assert_eq!(hook.phone.as_deref(), Some("5551234567"));
        assert!(hook.channel.is_none());
        assert_eq!(hook.meta.unwrap()["list_id"], "list_123");
    }
}
