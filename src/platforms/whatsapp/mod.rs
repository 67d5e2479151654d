//! WhatsApp platform connector
//!
//! The WhatsApp Web session runs inside an external browser automation
//! bridge. This module speaks the bridge's WebSocket protocol: it starts the
//! session, follows its pairing/authentication events and forwards sends.

mod bridge;
mod connector_impl;
mod media;
mod types;

pub use bridge::{BridgeConnection, BridgeOptions};
pub use connector_impl::{chat_id, WhatsappConnector, DISABLED_MESSAGE};
pub use media::{fetch_media, filename_from_url, MediaLimits};
pub use types::*;
