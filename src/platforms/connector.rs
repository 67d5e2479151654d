//! Connector trait defining the contract every platform backend implements

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::types::{
    ConnectorCapabilities, ConnectorStatus, MessageRequest, MessageResponse, Platform,
};

/// Trait that all platform connectors must implement
///
/// A connector owns one backend's session lifecycle and message encoding.
/// Connectors are shared as `Arc<dyn Connector>`, so every method takes
/// `&self` and connectors manage their own interior state.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Platform served by this connector
    fn platform(&self) -> Platform;

    /// How this connector encodes the different message kinds
    fn capabilities(&self) -> &ConnectorCapabilities;

    /// Establish the session with the backend
    ///
    /// Idempotent: returns immediately when already initialized. On failure
    /// the status records the error and the error is returned.
    async fn initialize(&self) -> Result<()>;

    /// Send a message
    ///
    /// Never fails: not-ready connectors, missing media and backend errors
    /// all come back as a response with `success == false`.
    async fn send_message(&self, request: &MessageRequest) -> MessageResponse;

    /// Snapshot of the current status
    async fn get_status(&self) -> Result<ConnectorStatus>;

    /// Initialized AND currently connected
    fn is_ready(&self) -> bool;

    /// Release backend resources
    ///
    /// Idempotent. Cleanup failures are logged, never returned.
    async fn destroy(&self);

    /// Platform-specific structural check of a request
    fn validate_message(&self, request: &MessageRequest) -> bool;

    /// Why the connector refuses every request, if it is disabled
    fn unavailable_reason(&self) -> Option<String> {
        None
    }

    /// Subscribe to status changes
    fn subscribe(&self) -> watch::Receiver<ConnectorStatus>;
}
