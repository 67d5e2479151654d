//! Core types for the messaging gateway
//!
//! This module contains platform-agnostic types used across all connectors.

pub mod campaign;
pub mod capabilities;
pub mod connection;
pub mod message;

// Re-export for convenience
pub use campaign::CampaignWebhook;
pub use capabilities::ConnectorCapabilities;
pub use connection::{ConnectionState, ConnectorStatus, StatusCell};
pub use message::{timestamp_now, MessageKind, MessageRequest, MessageResponse, Platform};
