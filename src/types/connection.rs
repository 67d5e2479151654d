//! Connector connection state and status snapshots
//!
//! Each connector owns exactly one [`StatusCell`]. Backend callbacks are
//! translated into transition calls on the cell, and every transition is
//! applied atomically to the snapshot held in a `watch` channel. Callers read
//! owned clones or subscribe to changes.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::message::Platform;

/// Connector lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ConnectionState {
    /// Not initialized yet, or destroyed
    #[default]
    Uninitialized,
    /// Session/credentials are being established
    Initializing,
    /// Waiting for an out-of-band pairing code to be scanned
    PairingRequired,
    /// Authenticated and able to send
    Connected,
    /// Connection lost after having been established
    Disconnected,
    /// Initialization or authentication failed
    Failed,
    /// Administratively disabled for this deployment
    Disabled,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        if next == Uninitialized {
            return true;
        }
        match self {
            Uninitialized => matches!(next, Initializing | Disabled),
            Initializing => matches!(next, PairingRequired | Connected | Disconnected | Failed),
            PairingRequired => matches!(next, PairingRequired | Connected | Disconnected | Failed),
            Connected => matches!(next, Connected | Disconnected | Failed),
            Disconnected => matches!(next, Initializing | Connected | Failed),
            Failed => matches!(next, Initializing),
            Disabled => false,
        }
    }
}

/// Read-only snapshot of a connector's status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorStatus {
    pub is_connected: bool,
    pub platform: Platform,
    pub state: ConnectionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Pairing payload (WhatsApp only), present until authentication completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectorStatus {
    /// Initial status of a connector
    pub fn new(platform: Platform) -> Self {
        ConnectorStatus {
            is_connected: false,
            platform,
            state: ConnectionState::Uninitialized,
            last_seen: None,
            qr_code: None,
            phone_number: None,
            workspace_name: None,
            error: None,
        }
    }

    /// Status entry standing in for a connector whose status could not be read
    pub fn degraded(platform: Platform, error: impl Into<String>) -> Self {
        ConnectorStatus {
            state: ConnectionState::Failed,
            error: Some(error.into()),
            ..ConnectorStatus::new(platform)
        }
    }
}

/// Owner of a connector's mutable status
pub struct StatusCell {
    tx: watch::Sender<ConnectorStatus>,
    initialized: AtomicBool,
}

impl StatusCell {
    pub fn new(platform: Platform) -> Self {
        let (tx, _rx) = watch::channel(ConnectorStatus::new(platform));
        StatusCell {
            tx,
            initialized: AtomicBool::new(false),
        }
    }

    /// Owned copy of the current status
    pub fn snapshot(&self) -> ConnectorStatus {
        self.tx.borrow().clone()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectorStatus> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        self.tx.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.tx.borrow().is_connected
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn set_initialized(&self, initialized: bool) {
        self.initialized.store(initialized, Ordering::SeqCst);
    }

    /// Initialized AND connected
    pub fn is_ready(&self) -> bool {
        self.is_initialized() && self.is_connected()
    }

    /// Apply a state transition plus field updates as one atomic change
    ///
    /// Returns false (and leaves the status untouched) when the transition is
    /// not allowed from the current state.
    pub fn transition(
        &self,
        next: ConnectionState,
        apply: impl FnOnce(&mut ConnectorStatus),
    ) -> bool {
        let mut from = None;
        let applied = self.tx.send_if_modified(|status| {
            from = Some(status.state);
            if !status.state.can_transition_to(next) {
                return false;
            }
            status.state = next;
            status.is_connected = next == ConnectionState::Connected;
            apply(status);
            true
        });

        let platform = self.tx.borrow().platform;
        if applied {
            debug!(%platform, ?from, to = ?next, "connector state transition");
        } else {
            warn!(%platform, ?from, to = ?next, "ignoring invalid connector state transition");
        }
        applied
    }

    pub fn begin_initializing(&self) -> bool {
        self.transition(ConnectionState::Initializing, |s| s.error = None)
    }

    /// A pairing code was issued and must be scanned
    pub fn pairing_required(&self, code: impl Into<String>) -> bool {
        let code = code.into();
        self.transition(ConnectionState::PairingRequired, move |s| {
            s.qr_code = Some(code);
        })
    }

    /// Authentication completed; `apply` records identity fields
    pub fn connected(&self, apply: impl FnOnce(&mut ConnectorStatus)) -> bool {
        self.transition(ConnectionState::Connected, move |s| {
            s.qr_code = None;
            s.error = None;
            s.last_seen = Some(Utc::now());
            apply(s);
        })
    }

    pub fn disconnected(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.transition(ConnectionState::Disconnected, move |s| {
            s.error = Some(reason);
        })
    }

    pub fn failed(&self, error: impl Into<String>) -> bool {
        let error = error.into();
        self.transition(ConnectionState::Failed, move |s| {
            s.qr_code = None;
            s.error = Some(error);
        })
    }

    pub fn disabled(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.transition(ConnectionState::Disabled, move |s| {
            s.error = Some(reason);
        })
    }

    /// Back to uninitialized (teardown); always allowed
    pub fn reset(&self) {
        self.set_initialized(false);
        self.transition(ConnectionState::Uninitialized, |s| {
            s.qr_code = None;
        });
    }
}
