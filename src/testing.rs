//! In-memory connector used by unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{Error, ErrorCode, Result};
use crate::platforms::Connector;
use crate::types::{
    ConnectorCapabilities, ConnectorStatus, MessageRequest, MessageResponse, Platform, StatusCell,
};

pub(crate) struct FakeConnector {
    platform: Platform,
    capabilities: ConnectorCapabilities,
    status: StatusCell,
    init_error: Option<String>,
    init_delay: Duration,
    status_error: Option<String>,
    send_error: Option<String>,
    disabled: Option<String>,
    accept_messages: bool,
    pub sent: Mutex<Vec<MessageRequest>>,
    pub init_calls: AtomicUsize,
    pub destroyed: AtomicBool,
}

impl FakeConnector {
    pub fn new(platform: Platform) -> Self {
        let capabilities = match platform {
            Platform::Whatsapp => ConnectorCapabilities::whatsapp(),
            Platform::Slack => ConnectorCapabilities::slack(),
        };
        Self {
            platform,
            capabilities,
            status: StatusCell::new(platform),
            init_error: None,
            init_delay: Duration::ZERO,
            status_error: None,
            send_error: None,
            disabled: None,
            accept_messages: true,
            sent: Mutex::new(Vec::new()),
            init_calls: AtomicUsize::new(0),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Already initialized and connected
    pub fn connected(platform: Platform) -> Self {
        let fake = Self::new(platform);
        fake.status.begin_initializing();
        fake.status.connected(|_| {});
        fake.status.set_initialized(true);
        fake
    }

    pub fn failing_init(mut self, error: &str) -> Self {
        self.init_error = Some(error.to_string());
        self
    }

    pub fn slow_init(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    pub fn failing_status(mut self, error: &str) -> Self {
        self.status_error = Some(error.to_string());
        self
    }

    pub fn failing_sends(mut self, error: &str) -> Self {
        self.send_error = Some(error.to_string());
        self
    }

    pub fn rejecting_messages(mut self) -> Self {
        self.accept_messages = false;
        self
    }

    pub fn disabled(mut self, reason: &str) -> Self {
        self.disabled = Some(reason.to_string());
        self
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn capabilities(&self) -> &ConnectorCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if !self.init_delay.is_zero() {
            tokio::time::sleep(self.init_delay).await;
        }
        if self.status.is_initialized() {
            return Ok(());
        }
        self.status.begin_initializing();
        if let Some(error) = &self.init_error {
            self.status.failed(error.clone());
            return Err(Error::new(ErrorCode::BackendError, error.clone()));
        }
        self.status.connected(|_| {});
        self.status.set_initialized(true);
        Ok(())
    }

    async fn send_message(&self, request: &MessageRequest) -> MessageResponse {
        let count = {
            let mut sent = match self.sent.lock() {
                Ok(sent) => sent,
                Err(poisoned) => poisoned.into_inner(),
            };
            sent.push(request.clone());
            sent.len()
        };
        match &self.send_error {
            Some(error) => MessageResponse::failure(self.platform, error.clone()),
            None => MessageResponse::sent(self.platform, format!("fake-{count}")),
        }
    }

    async fn get_status(&self) -> Result<ConnectorStatus> {
        match &self.status_error {
            Some(error) => Err(Error::new(ErrorCode::BackendError, error.clone())),
            None => Ok(self.status.snapshot()),
        }
    }

    fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    async fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.status.reset();
    }

    fn validate_message(&self, request: &MessageRequest) -> bool {
        self.disabled.is_none() && self.accept_messages && request.has_required_media()
    }

    fn unavailable_reason(&self) -> Option<String> {
        self.disabled.clone()
    }

    fn subscribe(&self) -> watch::Receiver<ConnectorStatus> {
        self.status.subscribe()
    }
}
