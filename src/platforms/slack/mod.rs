//! Slack platform connector
//!
//! Talks to the Slack Web API (`auth.test`, `chat.postMessage`) with a bot
//! token. Images are embedded with Block Kit; other media are posted as links.

mod auth;
mod chat;
mod client;
mod connector_impl;
mod types;

pub use chat::{file_link_text, image_blocks};
pub use client::SlackClient;
pub use connector_impl::SlackConnector;
pub use types::*;
