use futures::{stream::{SplitSink, SplitStream}, SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::error::{Error, ErrorCode, Result};
use crate::types::StatusCell;

use super::types::{BridgeEvent, BridgeFrame, BridgeRequest};

/// Type alias for the WebSocket write half
type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
/// Type alias for the WebSocket read half
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
/// Requests waiting for their `seq_reply`
type PendingReplies = Arc<Mutex<HashMap<i64, oneshot::Sender<Result<Value>>>>>;

/// Configuration for the bridge connection
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Ping interval (default: 30s)
    pub ping_interval: Duration,
    /// How long a request waits for its reply (default: 60s)
    pub request_timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// WebSocket connection to the WhatsApp automation bridge
///
/// Requests are correlated with replies through their sequence number.
/// Session events are applied to the connector's [`StatusCell`] by the
/// reader task.
pub struct BridgeConnection {
    /// WebSocket write half
    ws_writer: Arc<Mutex<Option<WsWriter>>>,
    pending: PendingReplies,
    /// Sequence number for requests
    seq_number: AtomicI64,
    /// Shutdown signal sender
    shutdown_tx: mpsc::Sender<()>,
    request_timeout: Duration,
}

impl BridgeConnection {
    /// Connect to the bridge and start the reader task
    ///
    /// # Arguments
    /// * `url` - WebSocket URL of the bridge
    /// * `options` - Ping interval and request timeout
    /// * `status` - Status cell updated from bridge events
    ///
    /// # Returns
    /// A Result containing the connection or an Error
    pub async fn connect(url: &str, options: BridgeOptions, status: Arc<StatusCell>) -> Result<Self> {
        let (ws_stream, _) = connect_async(url).await.map_err(|e| {
            Error::new(ErrorCode::NetworkError, format!("Bridge connection failed: {e}"))
        })?;
        debug!(url, "connected to WhatsApp bridge");

        let (write, read) = ws_stream.split();
        let ws_writer = Arc::new(Mutex::new(Some(write)));
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(Self::run_reader(
            read,
            Arc::clone(&ws_writer),
            Arc::clone(&pending),
            status,
            options.ping_interval,
            shutdown_rx,
        ));

        Ok(Self {
            ws_writer,
            pending,
            seq_number: AtomicI64::new(1),
            shutdown_tx,
            request_timeout: options.request_timeout,
        })
    }

    /// Send a request and wait for its reply
    ///
    /// # Arguments
    /// * `action` - Bridge action name
    /// * `data` - Action payload
    ///
    /// # Returns
    /// The reply's `data` on `OK`, a `BackendError` on `FAIL`, a `Timeout`
    /// if no reply arrives in time, or a `NetworkError` if the socket closes.
    pub async fn request(&self, action: &str, data: Value) -> Result<Value> {
        let seq = self.seq_number.fetch_add(1, Ordering::SeqCst);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(seq, reply_tx);

        let frame = serde_json::to_string(&BridgeRequest { seq, action, data })
            .map_err(|e| Error::new(ErrorCode::Unknown, format!("Failed to serialize request: {e}")))?;

        if let Err(e) = self.send_ws_message(Message::Text(frame)).await {
            self.pending.lock().await.remove(&seq);
            return Err(e);
        }
        debug!(seq, action, "bridge request sent");

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(Error::new(ErrorCode::NetworkError, "Bridge connection closed")),
            Err(_) => {
                self.pending.lock().await.remove(&seq);
                Err(Error::new(
                    ErrorCode::Timeout,
                    format!(
                        "Bridge did not answer '{action}' within {}s",
                        self.request_timeout.as_secs()
                    ),
                ))
            }
        }
    }

    /// Stop the reader task and close the socket
    pub async fn close(&self) {
        // The reader may already be gone when the bridge closed first
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Send a WebSocket message
    async fn send_ws_message(&self, message: Message) -> Result<()> {
        let mut writer = self.ws_writer.lock().await;
        if let Some(ws) = writer.as_mut() {
            ws.send(message).await.map_err(|e| {
                Error::new(ErrorCode::NetworkError, format!("Failed to send bridge message: {e}"))
            })
        } else {
            Err(Error::new(ErrorCode::InvalidState, "Bridge not connected"))
        }
    }

    async fn run_reader(
        mut read: WsReader,
        ws_writer: Arc<Mutex<Option<WsWriter>>>,
        pending: PendingReplies,
        status: Arc<StatusCell>,
        ping_interval: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut ping_timer = tokio::time::interval(ping_interval);
        ping_timer.tick().await; // Skip first immediate tick

        // None when the shutdown was requested locally
        let lost: Option<String> = loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_frame(&text, &pending, &status).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Some(writer) = ws_writer.lock().await.as_mut() {
                                if let Err(e) = writer.send(Message::Pong(data)).await {
                                    break Some(format!("failed to send pong: {e}"));
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) => break Some("bridge closed the connection".to_string()),
                        Some(Err(e)) => break Some(format!("bridge socket error: {e}")),
                        None => break Some("bridge stream ended".to_string()),
                        Some(Ok(_)) => {}
                    }
                }
                _ = ping_timer.tick() => {
                    if let Some(writer) = ws_writer.lock().await.as_mut() {
                        if let Err(e) = writer.send(Message::Ping(vec![])).await {
                            break Some(format!("failed to send ping: {e}"));
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("bridge shutdown requested");
                    if let Some(mut writer) = ws_writer.lock().await.take() {
                        let _ = writer.close().await;
                    }
                    break None;
                }
            }
        };

        *ws_writer.lock().await = None;
        for (_, reply_tx) in pending.lock().await.drain() {
            let _ = reply_tx.send(Err(Error::new(ErrorCode::NetworkError, "Bridge connection closed")));
        }

        if let Some(reason) = lost {
            warn!(%reason, "WhatsApp bridge connection lost");
            // The session is gone with the socket; allow initialize to reconnect
            status.set_initialized(false);
            status.disconnected(reason);
        }
    }

    /// Route a frame to its waiting request or apply it as an event
    async fn handle_frame(text: &str, pending: &PendingReplies, status: &StatusCell) {
        let frame: BridgeFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                let snippet: String = text.chars().take(200).collect();
                warn!(error = %e, raw = %snippet, "failed to parse bridge frame");
                return;
            }
        };

        if let Some(seq) = frame.seq_reply {
            let Some(reply_tx) = pending.lock().await.remove(&seq) else {
                debug!(seq, "dropping reply with no waiting request");
                return;
            };
            let reply = if frame.is_ok() {
                Ok(frame.data)
            } else {
                Err(Error::new(
                    ErrorCode::BackendError,
                    frame.error.unwrap_or_else(|| "Bridge request failed".to_string()),
                ))
            };
            let _ = reply_tx.send(reply);
            return;
        }

        if let Some(name) = frame.event.as_deref() {
            apply_event(status, BridgeEvent::parse(name, &frame.data));
        }
    }
}

/// Translate a bridge event into a status transition
pub(crate) fn apply_event(status: &StatusCell, event: BridgeEvent) {
    match event {
        BridgeEvent::Qr(code) => {
            info!("WhatsApp pairing code received, scan it to authenticate");
            status.pairing_required(code);
        }
        BridgeEvent::Authenticated { phone } => {
            info!("WhatsApp client authenticated");
            status.connected(|s| {
                if phone.is_some() {
                    s.phone_number = phone;
                }
            });
        }
        BridgeEvent::Ready { phone } => {
            info!("WhatsApp client is ready");
            status.connected(|s| {
                if phone.is_some() {
                    s.phone_number = phone;
                }
            });
        }
        BridgeEvent::AuthFailure(message) => {
            error!(%message, "WhatsApp authentication failure");
            status.set_initialized(false);
            status.failed(message);
        }
        BridgeEvent::Disconnected(reason) => {
            warn!(%reason, "WhatsApp client disconnected");
            status.set_initialized(false);
            status.disconnected(reason);
        }
        BridgeEvent::Message { from, body } => {
            debug!(?from, length = body.as_deref().map_or(0, str::len), "incoming WhatsApp message");
        }
        BridgeEvent::Unknown(name) => {
            debug!(event = %name, "ignoring unknown bridge event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConnectionState, Platform};

    #[test]
    fn test_qr_then_ready_clears_pairing_code() {
        let status = StatusCell::new(Platform::Whatsapp);
        status.begin_initializing();

        apply_event(&status, BridgeEvent::Qr("2@abc".into()));
        let snapshot = status.snapshot();
        assert_eq!(snapshot.state, ConnectionState::PairingRequired);
        assert_eq!(snapshot.qr_code.as_deref(), Some("2@abc"));

        apply_event(&status, BridgeEvent::Ready { phone: Some("15551234567".into()) });
        let snapshot = status.snapshot();
        assert!(snapshot.is_connected);
        assert!(snapshot.qr_code.is_none());
        assert_eq!(snapshot.phone_number.as_deref(), Some("15551234567"));
    }

    #[test]
    fn test_auth_failure_marks_failed() {
        let status = StatusCell::new(Platform::Whatsapp);
        status.begin_initializing();
        status.set_initialized(true);
        apply_event(&status, BridgeEvent::AuthFailure("bad session".into()));
        let snapshot = status.snapshot();
        assert_eq!(snapshot.state, ConnectionState::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("bad session"));
        assert!(!status.is_initialized());
    }

    #[test]
    fn test_disconnect_after_ready() {
        let status = StatusCell::new(Platform::Whatsapp);
        status.begin_initializing();
        status.set_initialized(true);
        apply_event(&status, BridgeEvent::Ready { phone: None });
        apply_event(&status, BridgeEvent::Disconnected("NAVIGATION".into()));
        let snapshot = status.snapshot();
        assert!(!snapshot.is_connected);
        assert_eq!(snapshot.state, ConnectionState::Disconnected);
        assert_eq!(snapshot.error.as_deref(), Some("NAVIGATION"));

        // Reconnecting goes back through initializing
        assert!(!status.is_initialized());
        assert!(status.begin_initializing());
    }

    #[test]
    fn test_message_event_leaves_status_unchanged() {
        let status = StatusCell::new(Platform::Whatsapp);
        let before = status.snapshot();
        apply_event(
            &status,
            BridgeEvent::Message { from: Some("1@c.us".into()), body: Some("hi".into()) },
        );
        assert_eq!(status.snapshot(), before);
    }

    #[tokio::test]
    async fn test_connect_to_missing_bridge_fails() {
        let status = Arc::new(StatusCell::new(Platform::Whatsapp));
        let result = BridgeConnection::connect("ws://127.0.0.1:1/bridge", BridgeOptions::default(), status).await;
        assert_eq!(result.err().map(|e| e.code), Some(ErrorCode::NetworkError));
    }
}
