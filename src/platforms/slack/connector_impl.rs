use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::config::SlackConfig;
use crate::error::{Error, Result};
use crate::platforms::Connector;
use crate::types::{
    ConnectorCapabilities, ConnectorStatus, MessageKind, MessageRequest, MessageResponse,
    Platform, StatusCell,
};

use super::chat::file_link_text;
use super::client::SlackClient;
use super::types::{AuthTestResponse, PostMessageResponse};

/// Connector for the Slack Web API
pub struct SlackConnector {
    config: SlackConfig,
    client: RwLock<Option<Arc<SlackClient>>>,
    /// Serializes concurrent `initialize` calls
    init_lock: Mutex<()>,
    status: StatusCell,
    capabilities: ConnectorCapabilities,
}

impl SlackConnector {
    /// Create a new, uninitialized Slack connector
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            init_lock: Mutex::new(()),
            status: StatusCell::new(Platform::Slack),
            capabilities: ConnectorCapabilities::slack(),
        }
    }

    /// Build a client from the configured token and verify it
    async fn connect(&self) -> Result<(SlackClient, AuthTestResponse)> {
        let token = self
            .config
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::configuration("SLACK_BOT_TOKEN is required"))?;

        let client = SlackClient::new(&self.config.api_base_url, token)?;
        let auth = client.auth_test().await?;
        Ok((client, auth))
    }

    async fn deliver(&self, client: &SlackClient, request: &MessageRequest) -> Result<PostMessageResponse> {
        let channel = request.to.as_str();
        if request.kind == MessageKind::Text {
            return client.post_text(channel, &request.message).await;
        }

        let media_url = request
            .media_url()
            .ok_or_else(|| Error::invalid_argument("Media URL is required for media messages"))?;
        let caption = request.caption.as_deref();

        match request.kind {
            MessageKind::Image => client.post_image(channel, media_url, caption).await,
            _ => {
                let text = file_link_text(request.filename.as_deref(), caption, media_url);
                client.post_text(channel, &text).await
            }
        }
    }
}

#[async_trait]
impl Connector for SlackConnector {
    fn platform(&self) -> Platform {
        Platform::Slack
    }

    fn capabilities(&self) -> &ConnectorCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> Result<()> {
        let _guard = self.init_lock.lock().await;
        if self.status.is_initialized() {
            return Ok(());
        }

        info!("Initializing Slack connector");
        self.status.begin_initializing();

        match self.connect().await {
            Ok((client, auth)) => {
                *self.client.write().await = Some(Arc::new(client));
                let workspace = auth.team.clone();
                self.status.connected(|s| s.workspace_name = workspace);
                self.status.set_initialized(true);
                info!(
                    workspace = auth.team.as_deref().unwrap_or("unknown"),
                    "Slack connector initialized"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize Slack connector");
                self.status.failed(e.message.clone());
                Err(e.with_platform(Platform::Slack))
            }
        }
    }

    async fn send_message(&self, request: &MessageRequest) -> MessageResponse {
        let client = self.client.read().await.clone();
        let client = match client {
            Some(client) if self.status.is_connected() => client,
            _ => return MessageResponse::failure(Platform::Slack, "Slack client not connected"),
        };

        match self.deliver(&client, request).await {
            Ok(posted) => {
                info!(channel = %request.to, kind = ?request.kind, ts = %posted.ts, "Slack message sent");
                MessageResponse::sent(Platform::Slack, posted.ts)
            }
            Err(e) => {
                error!(channel = %request.to, error = %e, "Failed to send Slack message");
                MessageResponse::failure(Platform::Slack, e.message)
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
        // Waits out an in-flight initialize so its result cannot outlive the reset
        let _guard = self.init_lock.lock().await;
        let had_client = self.client.write().await.take().is_some();
        self.status.reset();
        if had_client {
            info!("Slack connector destroyed");
        }
    }

    fn validate_message(&self, request: &MessageRequest) -> bool {
        let to = request.to.as_str();
        if to.is_empty() {
            return false;
        }
        if !(to.starts_with('#') || to.starts_with('@') || to.starts_with('C') || to.starts_with('U')) {
            warn!(to, "rejecting Slack destination with unknown prefix");
            return false;
        }
        request.has_required_media()
    }

    fn subscribe(&self) -> watch::Receiver<ConnectorStatus> {
        self.status.subscribe()
    }
}
