//! TCP transport for network MCP servers
//!
//! Each message is written as one line of JSON followed by `\n` and read
//! back up to the next `\n`. The read and write halves of the socket are
//! locked independently so a blocked `receive` never stalls `send`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::{NavigatorError, Result};
use crate::mcp::transport::framing::{
    line_reader, line_writer, read_message, write_message, LineReader, LineWriter, Shutdown,
};
use crate::mcp::transport::Transport;
use crate::mcp::types::Message;

/// Default dial timeout.
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_secs(30);

/// Newline-delimited JSON over a TCP stream.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mcp_navigator::mcp::transport::{TcpTransport, Transport};
///
/// let transport = TcpTransport::new("localhost", 8811).with_timeout(Duration::from_secs(5));
/// assert_eq!(transport.address(), "localhost:8811");
/// assert!(!transport.is_connected());
/// ```
#[derive(Debug)]
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    reader: Mutex<Option<LineReader<OwnedReadHalf>>>,
    writer: Mutex<Option<LineWriter<OwnedWriteHalf>>>,
    connected: AtomicBool,
    shutdown: Shutdown,
}

impl TcpTransport {
    /// Create an unconnected transport for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TCP_TIMEOUT,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            connected: AtomicBool::new(false),
            shutdown: Shutdown::default(),
        }
    }

    /// Set the dial timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Change the dial timeout of an existing transport.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Configured dial timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `host:port` this transport dials.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, timeout: Duration) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let address = self.address();
        let limit = timeout.min(self.timeout);
        tracing::debug!(
            target: "mcp_navigator::mcp::transport::tcp",
            address = %address,
            timeout = ?limit,
            "dialing"
        );

        let stream = match tokio::time::timeout(limit, TcpStream::connect(address.as_str())).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(NavigatorError::connect(address, e)),
            Err(_) => {
                return Err(NavigatorError::connect(
                    address,
                    NavigatorError::timeout("dial", limit),
                ))
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(
                target: "mcp_navigator::mcp::transport::tcp",
                "set_nodelay failed: {}",
                e
            );
        }

        let (read_half, write_half) = stream.into_split();
        *self.reader.lock().await = Some(line_reader(read_half));
        *self.writer.lock().await = Some(line_writer(write_half));
        self.shutdown.reset();
        self.connected.store(true, Ordering::SeqCst);

        tracing::info!(
            target: "mcp_navigator::mcp::transport::tcp",
            address = %address,
            "connected"
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.shutdown.trigger();

        if let Some(mut writer) = self.writer.lock().await.take() {
            // Peer may already be gone; shutdown errors carry no information.
            if let Err(e) = writer.get_mut().shutdown().await {
                tracing::debug!(
                    target: "mcp_navigator::mcp::transport::tcp",
                    "shutdown of write half failed: {}",
                    e
                );
            }
        }
        self.reader.lock().await.take();
        Ok(())
    }

    async fn send(&self, message: &Message) -> Result<()> {
        if !self.is_connected() {
            return Err(NavigatorError::TransportNotConnected);
        }
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or(NavigatorError::TransportNotConnected)?;
        write_message(writer, message).await
    }

    async fn receive(&self) -> Result<Message> {
        if !self.is_connected() {
            return Err(NavigatorError::TransportNotConnected);
        }
        let stop = self.shutdown.token();
        let mut guard = self.reader.lock().await;
        let reader = guard
            .as_mut()
            .ok_or(NavigatorError::TransportNotConnected)?;

        let next = tokio::select! {
            _ = stop.cancelled() => return Err(NavigatorError::ConnectionClosed),
            next = read_message(reader) => next?,
        };
        match next {
            Some(message) => Ok(message),
            None => {
                self.connected.store(false, Ordering::SeqCst);
                Err(NavigatorError::ConnectionClosed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> String {
        format!("tcp://{}", self.address())
    }
}
