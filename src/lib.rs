//! msgateway - unified messaging gateway
//!
//! Accepts normalized send requests over HTTP and dispatches them to
//! platform connectors (WhatsApp through an automation bridge, Slack through
//! its Web API). Connectors share one lifecycle contract, see
//! [`platforms::Connector`].

// Core modules
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod platforms;
pub mod registry;
pub mod server;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::GatewayConfig;
pub use dispatch::DispatchService;
pub use error::{Error, ErrorCode, Result};
pub use health::{HealthAggregator, HealthReport};
pub use platforms::{Connector, SlackConnector, WhatsappConnector};
pub use registry::ConnectorRegistry;
pub use types::{
    ConnectionState, ConnectorCapabilities, ConnectorStatus, MessageKind, MessageRequest,
    MessageResponse, Platform,
};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
