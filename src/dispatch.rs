//! Dispatch service
//!
//! Validates normalized requests against the selected connector and forwards
//! them. Every outcome, including errors, is a [`MessageResponse`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, ErrorCode, Result};
use crate::registry::ConnectorRegistry;
use crate::types::{CampaignWebhook, MessageRequest, MessageResponse, Platform};

/// Channel used for Slack campaign messages without an explicit channel
pub const DEFAULT_SLACK_CHANNEL: &str = "#general";

pub struct DispatchService {
    registry: Arc<ConnectorRegistry>,
}

impl DispatchService {
    pub fn new(registry: Arc<ConnectorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        &self.registry
    }

    /// Send a request through its platform's connector
    ///
    /// Never fails: an unknown platform, a disabled connector, an invalid
    /// message or a connector that is not ready all produce a failed response
    /// without reaching the backend.
    pub async fn send(&self, request: &MessageRequest) -> MessageResponse {
        match self.try_send(request).await {
            Ok(response) => {
                if response.success {
                    info!(platform = %request.platform, to = %request.to, "Message dispatched");
                }
                response
            }
            Err(e) => {
                warn!(platform = %request.platform, to = %request.to, error = %e, "Message rejected");
                MessageResponse::failure(request.platform, e.message)
            }
        }
    }

    /// Render and send a campaign webhook as a text message
    pub async fn send_campaign(&self, webhook: &CampaignWebhook) -> MessageResponse {
        info!(
            id = %webhook.id,
            campaign_id = %webhook.campaign_id,
            platform = %webhook.platform,
            "Processing campaign message"
        );
        self.send(&campaign_request(webhook)).await
    }

    async fn try_send(&self, request: &MessageRequest) -> Result<MessageResponse> {
        let platform = request.platform;
        let connector = self.registry.lookup(platform)?;

        if let Some(reason) = connector.unavailable_reason() {
            return Err(Error::new(ErrorCode::InvalidState, reason).with_platform(platform));
        }
        if !connector.validate_message(request) {
            return Err(Error::invalid_argument(format!("Invalid message format for {platform}"))
                .with_platform(platform));
        }
        if !connector.is_ready() {
            return Err(Error::not_ready(platform));
        }

        Ok(connector.send_message(request).await)
    }
}

/// Text request for a campaign webhook
pub fn campaign_request(webhook: &CampaignWebhook) -> MessageRequest {
    MessageRequest::text(
        webhook.platform,
        campaign_destination(webhook),
        render_campaign_message(webhook),
    )
}

/// Phone (or email) for WhatsApp, channel (or `#general`) for Slack
pub fn campaign_destination(webhook: &CampaignWebhook) -> String {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
    match webhook.platform {
        Platform::Whatsapp => non_empty(&webhook.phone).unwrap_or_else(|| webhook.email.clone()),
        Platform::Slack => {
            non_empty(&webhook.channel).unwrap_or_else(|| DEFAULT_SLACK_CHANNEL.to_string())
        }
    }
}

pub fn render_campaign_message(webhook: &CampaignWebhook) -> String {
    format!(
        "📧 *{subject}*\n\n{text}\n\n---\n*Sent via {platform} from Listmonk*\n*ID: {id} | Campaign: {campaign}*",
        subject = webhook.subject,
        text = webhook.text,
        platform = webhook.platform.display_name(),
        id = webhook.id,
        campaign = webhook.campaign_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::Connector;
    use crate::testing::FakeConnector;
    use crate::types::MessageKind;

    fn service(connectors: Vec<Arc<dyn Connector>>) -> DispatchService {
        DispatchService::new(Arc::new(ConnectorRegistry::new(connectors)))
    }

    fn webhook(platform: Platform) -> CampaignWebhook {
        CampaignWebhook {
            id: "msg_1".into(),
            campaign_id: "camp_1".into(),
            email: "user@example.com".into(),
            name: "John Doe".into(),
            subject: "S".into(),
            body: "<p>T</p>".into(),
            text: "T".into(),
            phone: None,
            channel: None,
            platform,
            meta: None,
        }
    }

    #[tokio::test]
    async fn test_send_text_to_ready_connector() {
        let slack = Arc::new(FakeConnector::connected(Platform::Slack));
        let service = service(vec![slack.clone()]);

        let response = service
            .send(&MessageRequest::text(Platform::Slack, "#general", "Hello"))
            .await;
        assert!(response.success);
        assert_eq!(response.message_id.as_deref(), Some("fake-1"));
        assert_eq!(response.platform, Platform::Slack);
        assert_eq!(slack.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_message_never_reaches_connector() {
        let slack = Arc::new(FakeConnector::connected(Platform::Slack).rejecting_messages());
        let service = service(vec![slack.clone()]);

        let response = service
            .send(&MessageRequest::text(Platform::Slack, "general", "Hello"))
            .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Invalid message format for slack"));
        assert_eq!(slack.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_media_without_url_is_rejected() {
        let whatsapp = Arc::new(FakeConnector::connected(Platform::Whatsapp));
        let service = service(vec![whatsapp.clone()]);

        let mut request = MessageRequest::text(Platform::Whatsapp, "1234567890", "look");
        request.kind = MessageKind::Image;
        let response = service.send(&request).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Invalid message format for whatsapp"));
        assert_eq!(whatsapp.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_not_ready_connector() {
        let slack = Arc::new(FakeConnector::new(Platform::Slack));
        let service = service(vec![slack.clone()]);

        let response = service
            .send(&MessageRequest::text(Platform::Slack, "#general", "Hello"))
            .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("slack service is not ready"));
        assert_eq!(slack.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_connector_reports_reason() {
        let whatsapp = Arc::new(
            FakeConnector::new(Platform::Whatsapp)
                .disabled("WhatsApp service disabled in constrained environment"),
        );
        let service = service(vec![whatsapp.clone()]);

        let response = service
            .send(&MessageRequest::text(Platform::Whatsapp, "1234567890", "hi"))
            .await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("disabled"));
        assert_eq!(response.platform, Platform::Whatsapp);
    }

    #[tokio::test]
    async fn test_unregistered_platform() {
        let service = service(vec![Arc::new(FakeConnector::connected(Platform::Slack))]);
        let response = service
            .send(&MessageRequest::text(Platform::Whatsapp, "1234567890", "hi"))
            .await;
        assert!(!response.success);
        assert_eq!(response.platform, Platform::Whatsapp);
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_backend_failure_is_returned_verbatim() {
        let slack = Arc::new(FakeConnector::connected(Platform::Slack).failing_sends("channel_not_found"));
        let service = service(vec![slack]);

        let response = service
            .send(&MessageRequest::text(Platform::Slack, "#nowhere", "hi"))
            .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("channel_not_found"));
    }

    #[test]
    fn test_render_campaign_message() {
        let rendered = render_campaign_message(&webhook(Platform::Whatsapp));
        assert_eq!(
            rendered,
            "📧 *S*\n\nT\n\n---\n*Sent via WhatsApp from Listmonk*\n*ID: msg_1 | Campaign: camp_1*"
        );
        assert!(render_campaign_message(&webhook(Platform::Slack)).contains("*Sent via Slack from Listmonk*"));
    }

    #[test]
    fn test_campaign_destination() {
        let mut hook = webhook(Platform::Whatsapp);
        assert_eq!(campaign_destination(&hook), "user@example.com");
        hook.phone = Some("5551234567".into());
        assert_eq!(campaign_destination(&hook), "5551234567");

        let mut hook = webhook(Platform::Slack);
        assert_eq!(campaign_destination(&hook), "#general");
        hook.channel = Some("#announcements".into());
        assert_eq!(campaign_destination(&hook), "#announcements");
    }

    #[tokio::test]
    async fn test_send_campaign_as_text() {
        let whatsapp = Arc::new(FakeConnector::connected(Platform::Whatsapp));
        let service = service(vec![whatsapp.clone()]);

        let mut hook = webhook(Platform::Whatsapp);
        hook.phone = Some("5551234567".into());
        let response = service.send_campaign(&hook).await;
        assert!(response.success);

        let sent = whatsapp.sent.lock().unwrap();
        assert_eq!(sent[0].to, "5551234567");
        assert_eq!(sent[0].kind, MessageKind::Text);
        assert!(sent[0].message.starts_with("📧 *S*"));
    }

    #[tokio::test]
    async fn test_campaign_failure_carries_platform() {
        let service = service(vec![Arc::new(FakeConnector::new(Platform::Slack))]);
        let response = service.send_campaign(&webhook(Platform::Slack)).await;
        assert!(!response.success);
        assert_eq!(response.platform, Platform::Slack);
        assert_eq!(response.error.as_deref(), Some("slack service is not ready"));
    }
}
