//! Platform-specific connectors
//!
//! Each platform module provides a connector that implements the
//! messaging capability contract for that specific service.

mod connector;

pub mod slack;
pub mod whatsapp;

// Re-export connector trait
pub use connector::Connector;
pub use slack::SlackConnector;
pub use whatsapp::WhatsappConnector;
