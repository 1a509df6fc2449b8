//! MCP transport abstraction and implementations
//!
//! This module defines the [`Transport`] trait shared by every way of
//! reaching an MCP server. Concrete implementations live in submodules:
//!
//! - [`tcp::TcpTransport`] -- newline-delimited JSON over a TCP stream.
//! - [`stdio::StdioTransport`] -- spawns a child process and frames
//!   messages over its stdin/stdout pipes.
//! - [`websocket::WebSocketTransport`] -- one JSON message per text frame
//!   over a WebSocket, pumped by background read/write tasks.
//! - `fake::FakeTransport` -- in-process fake used in unit tests
//!   (cfg(test) only).
//!
//! The set of real transports is closed: [`TransportSpec`] selects one at
//! construction time and hands it out as a `Box<dyn Transport>`. Nothing
//! downstream inspects the concrete type.
//!
//! # Canonical Import Path
//!
//! ```no_run
//! use mcp_navigator::mcp::transport::Transport;
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mcp::types::Message;

pub(crate) mod framing;
pub mod stdio;
pub mod tcp;
pub mod websocket;

#[cfg(test)]
pub mod fake;

pub use stdio::StdioTransport;
pub use tcp::TcpTransport;
pub use websocket::WebSocketTransport;

/// Abstraction over MCP transport implementations.
///
/// All methods take `&self`; implementations keep their connection state
/// behind interior locks so that a transport can be shared with a status
/// query while a `receive` is blocked.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use mcp_navigator::mcp::transport::{TcpTransport, Transport};
///
/// # #[tokio::main]
/// # async fn main() -> mcp_navigator::error::Result<()> {
/// let transport = TcpTransport::new("localhost", 8811);
/// transport.connect(Duration::from_secs(5)).await?;
/// assert!(transport.is_connected());
/// transport.close().await?;
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Establish the underlying connection.
    ///
    /// A second call while connected is a no-op. `timeout` bounds the call
    /// together with the transport's own configured timeout; the smaller of
    /// the two wins.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::NavigatorError::Connect`] wrapping the cause.
    async fn connect(&self, timeout: Duration) -> Result<()>;

    /// Release every resource held by the transport.
    ///
    /// Safe to call at any time, including before `connect` and after a
    /// failed `connect`.
    async fn close(&self) -> Result<()>;

    /// Serialize `message` and write it out completely.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::NavigatorError::TransportNotConnected`] when
    /// called before `connect`.
    async fn send(&self, message: &Message) -> Result<()>;

    /// Wait for the next complete inbound message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::NavigatorError::TransportNotConnected`] when
    /// called before `connect` and
    /// [`crate::error::NavigatorError::ConnectionClosed`] when the peer
    /// goes away.
    async fn receive(&self) -> Result<Message>;

    /// Point-in-time liveness; may change as soon as it returns.
    fn is_connected(&self) -> bool;

    /// Human readable endpoint used in logs and listings.
    fn endpoint(&self) -> String;
}

/// Tag naming one of the transport variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// TCP stream.
    Tcp,
    /// Child process pipes.
    Stdio,
    /// WebSocket text frames.
    #[serde(rename = "websocket")]
    WebSocket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Tcp => write!(f, "tcp"),
            TransportKind::Stdio => write!(f, "stdio"),
            TransportKind::WebSocket => write!(f, "websocket"),
        }
    }
}

/// Construction-time description of a transport.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mcp_navigator::mcp::transport::{TransportKind, TransportSpec};
///
/// let spec = TransportSpec::Tcp { host: "localhost".into(), port: 8811 };
/// assert_eq!(spec.kind(), TransportKind::Tcp);
/// let transport = spec.build(Duration::from_secs(30)).unwrap();
/// assert!(!transport.is_connected());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportSpec {
    /// TCP stream to `host:port`.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// Child process speaking over its standard streams.
    Stdio {
        /// Executable to spawn.
        command: String,
        /// Arguments passed to the executable.
        #[serde(default)]
        args: Vec<String>,
    },
    /// WebSocket endpoint.
    #[serde(rename = "websocket")]
    WebSocket {
        /// `ws://` or `wss://` URL.
        url: String,
    },
}

impl TransportSpec {
    /// The variant tag.
    pub fn kind(&self) -> TransportKind {
        match self {
            TransportSpec::Tcp { .. } => TransportKind::Tcp,
            TransportSpec::Stdio { .. } => TransportKind::Stdio,
            TransportSpec::WebSocket { .. } => TransportKind::WebSocket,
        }
    }

    /// Build an unconnected transport.
    ///
    /// `timeout` becomes the transport's connect and I/O timeout where the
    /// variant has one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::NavigatorError::Config`] for an invalid
    /// WebSocket URL.
    pub fn build(&self, timeout: Duration) -> Result<Box<dyn Transport>> {
        let transport: Box<dyn Transport> = match self {
            TransportSpec::Tcp { host, port } => {
                Box::new(TcpTransport::new(host.clone(), *port).with_timeout(timeout))
            }
            TransportSpec::Stdio { command, args } => {
                Box::new(StdioTransport::new(command.clone(), args.clone()))
            }
            TransportSpec::WebSocket { url } => Box::new(
                WebSocketTransport::new(url)?
                    .with_handshake_timeout(timeout)
                    .with_timeout(timeout),
            ),
        };
        Ok(transport)
    }
}

impl fmt::Display for TransportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportSpec::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            TransportSpec::Stdio { command, args } if args.is_empty() => {
                write!(f, "stdio:{}", command)
            }
            TransportSpec::Stdio { command, args } => {
                write!(f, "stdio:{} {}", command, args.join(" "))
            }
            TransportSpec::WebSocket { url } => write!(f, "{}", url),
        }
    }
}
