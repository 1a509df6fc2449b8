//! Fluent construction of [`McpClient`] values.

use std::time::Duration;

use crate::error::Result;
use crate::mcp::client::{ClientConfig, McpClient};
use crate::mcp::transport::{Transport, TransportSpec};
use crate::mcp::types::ClientCapabilities;

/// Default TCP host when no transport is chosen.
pub const DEFAULT_HOST: &str = "localhost";

/// Default TCP port when no transport is chosen.
pub const DEFAULT_PORT: u16 = 8811;

/// Builder for [`McpClient`].
///
/// Without an explicit transport the client dials `localhost:8811` over
/// TCP.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mcp_navigator::mcp::client::McpClient;
///
/// let client = McpClient::builder()
///     .stdio("npx", vec!["-y".into(), "@modelcontextprotocol/server-everything".into()])
///     .name("inspector")
///     .version("2.0.0")
///     .timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(client.config().name, "inspector");
/// assert!(!client.is_connected());
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    spec: TransportSpec,
    transport: Option<Box<dyn Transport>>,
    config: ClientConfig,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self {
            spec: TransportSpec::Tcp {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            transport: None,
            config: ClientConfig::default(),
        }
    }

    /// Use a TCP transport.
    pub fn tcp(mut self, host: impl Into<String>, port: u16) -> Self {
        self.spec = TransportSpec::Tcp {
            host: host.into(),
            port,
        };
        self.transport = None;
        self
    }

    /// Use a child-process transport.
    pub fn stdio(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.spec = TransportSpec::Stdio {
            command: command.into(),
            args,
        };
        self.transport = None;
        self
    }

    /// Use a WebSocket transport. The URL is validated by `build`.
    pub fn websocket(mut self, url: impl Into<String>) -> Self {
        self.spec = TransportSpec::WebSocket { url: url.into() };
        self.transport = None;
        self
    }

    /// Use a transport described by `spec`.
    pub fn spec(mut self, spec: TransportSpec) -> Self {
        self.spec = spec;
        self.transport = None;
        self
    }

    /// Use an already constructed transport.
    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Client name reported during the handshake.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Client version reported during the handshake.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Connect and request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Capabilities declared during the handshake.
    pub fn capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    /// Replace the whole client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::NavigatorError::Config`] when the selected
    /// WebSocket URL is invalid.
    pub fn build(self) -> Result<McpClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => self.spec.build(self.config.timeout)?,
        };
        Ok(McpClient::new(transport, self.config))
    }
}
