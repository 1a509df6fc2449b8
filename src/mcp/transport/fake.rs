//! In-process fake transport for MCP unit tests
//!
//! [`FakeTransport::new`] returns a `(FakeTransport, FakeTransportHandle)`
//! pair. The transport goes into the code under test; the test keeps the
//! handle to observe outbound traffic and inject inbound messages.
//!
//! ```text
//! client send() -----> outbound_tx -----> outbound_rx (handle reads)
//! handle inbound_tx -------------------> inbound_rx  (client receive())
//! ```
//!
//! Dropping `handle.inbound_tx` makes the next `receive` fail with
//! [`NavigatorError::ConnectionClosed`]. [`FakeTransportHandle::sever`]
//! flips the liveness flag without touching the channels.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::error::{NavigatorError, Result};
use crate::mcp::transport::Transport;
use crate::mcp::types::Message;

/// Counters and flags shared between the fake and its handle.
#[derive(Debug, Default)]
struct FakeState {
    connected: AtomicBool,
    connects: AtomicUsize,
    closes: AtomicUsize,
    refuse_connect: AtomicBool,
}

/// Channel-backed [`Transport`] for tests.
#[derive(Debug)]
pub struct FakeTransport {
    outbound_tx: mpsc::UnboundedSender<Message>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Message>>,
    state: Arc<FakeState>,
}

/// Test-side view of a [`FakeTransport`].
#[derive(Debug)]
pub struct FakeTransportHandle {
    /// Messages the client sent, in order.
    pub outbound_rx: mpsc::UnboundedReceiver<Message>,
    /// Messages the client will receive, in order.
    pub inbound_tx: mpsc::UnboundedSender<Message>,
    state: Arc<FakeState>,
}

impl FakeTransport {
    /// Create a new `(FakeTransport, FakeTransportHandle)` pair.
    pub fn new() -> (Self, FakeTransportHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let state = Arc::new(FakeState::default());

        let transport = Self {
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            state: state.clone(),
        };
        let handle = FakeTransportHandle {
            outbound_rx,
            inbound_tx,
            state,
        };
        (transport, handle)
    }
}

impl FakeTransportHandle {
    /// Queue a message for the client.
    pub fn inject(&self, message: Message) {
        let _ = self.inbound_tx.send(message);
    }

    /// Queue a raw JSON value for the client.
    pub fn inject_json(&self, value: serde_json::Value) {
        let message = serde_json::from_value(value).expect("injected value must be a Message");
        self.inject(message);
    }

    /// Wait for the next message the client sent.
    pub async fn next_sent(&mut self) -> Message {
        tokio::time::timeout(Duration::from_secs(5), self.outbound_rx.recv())
            .await
            .expect("timed out waiting for client message")
            .expect("fake transport dropped")
    }

    /// Mark the transport dead as if the peer vanished.
    pub fn sever(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
    }

    /// Make subsequent `connect` calls fail.
    pub fn refuse_connect(&self) {
        self.state.refuse_connect.store(true, Ordering::SeqCst);
    }

    /// Number of successful `connect` calls.
    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, _timeout: Duration) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        if self.state.refuse_connect.load(Ordering::SeqCst) {
            return Err(NavigatorError::connect(
                "fake",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            ));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, message: &Message) -> Result<()> {
        if !self.is_connected() {
            return Err(NavigatorError::TransportNotConnected);
        }
        self.outbound_tx
            .send(message.clone())
            .map_err(|_| NavigatorError::ConnectionClosed)
    }

    async fn receive(&self) -> Result<Message> {
        if !self.is_connected() {
            return Err(NavigatorError::TransportNotConnected);
        }
        self.inbound_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(NavigatorError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> String {
        "fake://".to_string()
    }
}
