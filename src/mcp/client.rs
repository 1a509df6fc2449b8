//! MCP protocol client
//!
//! [`McpClient`] owns one [`Transport`] and drives it through the session
//! lifecycle:
//!
//! ```text
//! Disconnected --connect--> Connected --initialize--> Initialized
//!       ^                                                  |
//!       +------------------- disconnect -------------------+
//! ```
//!
//! Requests are single-flight: each call sends one request and then reads
//! inbound messages until one carries the matching identifier. Messages
//! that do not match are logged and dropped. Concurrent callers sharing a
//! client must serialize their calls, otherwise one caller may consume
//! another caller's response.
//!
//! A transport send or receive failure drops the session back to
//! `Disconnected` and closes the transport. A request that merely times out
//! leaves the session as it was.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use crate::error::{ErrorCategory, NavigatorError, Result};
use crate::mcp::builder::ClientBuilder;
use crate::mcp::transport::Transport;
use crate::mcp::types::{
    Arguments, CallToolParams, CallToolResult, ClientCapabilities, GetPromptParams,
    GetPromptResult, Implementation, InitializeParams, InitializeResult, ListPromptsResult,
    ListResourcesResult, ListToolsResult, Message, Prompt, ReadResourceParams,
    ReadResourceResult, Resource, ServerCapabilities, Tool, METHOD_INITIALIZE,
    METHOD_INITIALIZED, METHOD_PING, METHOD_PROMPTS_GET, METHOD_PROMPTS_LIST,
    METHOD_RESOURCES_LIST, METHOD_RESOURCES_READ, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
    PROTOCOL_VERSION,
};

/// Default time to wait for a correlated response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default client name sent during the handshake.
pub const DEFAULT_CLIENT_NAME: &str = "mcp-client";

/// Default client version sent during the handshake.
pub const DEFAULT_CLIENT_VERSION: &str = "1.0.0";

/// Settings for an [`McpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Client name reported to servers.
    pub name: String,
    /// Client version reported to servers.
    pub version: String,
    /// Upper bound for connecting and for every request.
    pub timeout: Duration,
    /// Capabilities declared during the handshake.
    pub capabilities: ClientCapabilities,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLIENT_NAME.to_string(),
            version: DEFAULT_CLIENT_VERSION.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            capabilities: ClientCapabilities::default(),
        }
    }
}

impl ClientConfig {
    /// Identity pair built from `name` and `version`.
    pub fn client_info(&self) -> Implementation {
        Implementation::new(self.name.clone(), self.version.clone())
    }
}

/// Mutable session state. Guarded by one reader-writer lock.
#[derive(Debug, Default)]
struct Session {
    connected: bool,
    initialized: bool,
    server_info: Option<Implementation>,
    capabilities: Option<ServerCapabilities>,
}

/// High-level MCP client bound to one transport.
///
/// # Examples
///
/// ```no_run
/// use mcp_navigator::mcp::client::McpClient;
///
/// # #[tokio::main]
/// # async fn main() -> mcp_navigator::error::Result<()> {
/// let client = McpClient::builder().tcp("localhost", 8811).build()?;
/// client.connect(None).await?;
/// client.initialize(client.config().client_info(), None).await?;
/// for tool in client.list_tools(None).await? {
///     println!("{}", tool.name);
/// }
/// client.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct McpClient {
    transport: Box<dyn Transport>,
    config: ClientConfig,
    session: RwLock<Session>,
    next_id: AtomicU64,
}

impl McpClient {
    /// Create a client that owns `transport`.
    pub fn new(transport: Box<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            session: RwLock::new(Session::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Endpoint of the owned transport.
    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Connect the transport. A no-op when already connected.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Optional bound; the configured timeout applies when
    ///   `None` and caps any larger value.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`NavigatorError::Connect`] error.
    pub async fn connect(&self, timeout: Option<Duration>) -> Result<()> {
        if self.read_session().connected {
            return Ok(());
        }

        self.transport.connect(self.bound(timeout)).await?;
        self.write_session().connected = true;

        tracing::info!(
            target: "mcp_navigator::mcp::client",
            endpoint = %self.transport.endpoint(),
            "connected"
        );
        Ok(())
    }

    /// Perform the `initialize` handshake.
    ///
    /// Sends the protocol version, the configured capabilities and
    /// `client_info`, stores the server identity and capabilities from the
    /// response, then sends `notifications/initialized`. The client counts
    /// as initialized only once that notification has been written.
    ///
    /// # Errors
    ///
    /// - [`NavigatorError::NotConnected`] before [`McpClient::connect`].
    /// - [`NavigatorError::Protocol`] if the server rejects the handshake.
    /// - Transport and decode errors from the exchange.
    pub async fn initialize(
        &self,
        client_info: Implementation,
        timeout: Option<Duration>,
    ) -> Result<InitializeResult> {
        if !self.read_session().connected {
            return Err(NavigatorError::NotConnected);
        }

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: self.config.capabilities.clone(),
            client_info,
        };
        let result: InitializeResult = self
            .call(METHOD_INITIALIZE, Some(params), timeout)
            .await?;

        if result.protocol_version != PROTOCOL_VERSION {
            tracing::warn!(
                target: "mcp_navigator::mcp::client",
                requested = PROTOCOL_VERSION,
                offered = %result.protocol_version,
                "server answered with a different protocol version"
            );
        }

        {
            let mut session = self.write_session();
            session.server_info = Some(result.server_info.clone());
            session.capabilities = Some(result.capabilities.clone());
        }

        let notification = Message::notification(METHOD_INITIALIZED, None);
        if let Err(e) = self.transport.send(&notification).await {
            self.force_disconnect(&e).await;
            return Err(e);
        }
        self.write_session().initialized = true;

        tracing::info!(
            target: "mcp_navigator::mcp::client",
            server = %result.server_info,
            protocol_version = %result.protocol_version,
            "session initialized"
        );
        Ok(result)
    }

    /// Close the transport and clear all session state.
    ///
    /// Calling this on a disconnected client is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the transport's close error; the session is cleared either
    /// way.
    pub async fn disconnect(&self) -> Result<()> {
        {
            let mut session = self.write_session();
            if !session.connected {
                return Ok(());
            }
            *session = Session::default();
        }

        tracing::info!(
            target: "mcp_navigator::mcp::client",
            endpoint = %self.transport.endpoint(),
            "disconnecting"
        );
        self.transport.close().await
    }

    /// True between a successful `connect` and the next disconnect.
    pub fn is_connected(&self) -> bool {
        self.read_session().connected
    }

    /// True once the handshake has completed.
    pub fn is_initialized(&self) -> bool {
        self.read_session().initialized
    }

    /// Server identity from the handshake.
    pub fn server_info(&self) -> Option<Implementation> {
        self.read_session().server_info.clone()
    }

    /// Server capabilities from the handshake.
    pub fn server_capabilities(&self) -> Option<ServerCapabilities> {
        self.read_session().capabilities.clone()
    }

    /// Verify that the client is connected and its transport is still alive.
    ///
    /// A transport found dead ends the session: the client drops back to
    /// disconnected and the transport is closed.
    ///
    /// # Errors
    ///
    /// [`NavigatorError::NotConnected`] or
    /// [`NavigatorError::TransportNotConnected`]; nothing is sent.
    pub async fn check_connection(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(NavigatorError::NotConnected);
        }
        self.ensure_transport_alive().await
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// List the server's tools.
    pub async fn list_tools(&self, timeout: Option<Duration>) -> Result<Vec<Tool>> {
        self.ensure_initialized()?;
        let result: ListToolsResult = self.call(METHOD_TOOLS_LIST, None::<()>, timeout).await?;
        Ok(result.tools)
    }

    /// Invoke a tool with free-form arguments.
    ///
    /// Fails locally, without sending anything, when the transport is no
    /// longer alive.
    ///
    /// # Errors
    ///
    /// - [`NavigatorError::NotInitialized`] before the handshake.
    /// - [`NavigatorError::TransportNotConnected`] if the transport died.
    /// - [`NavigatorError::Protocol`] for server-side failures.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Arguments>,
        timeout: Option<Duration>,
    ) -> Result<CallToolResult> {
        self.ensure_initialized()?;
        self.check_connection().await?;
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.call(METHOD_TOOLS_CALL, Some(params), timeout).await
    }

    /// List the server's resources.
    pub async fn list_resources(&self, timeout: Option<Duration>) -> Result<Vec<Resource>> {
        self.ensure_initialized()?;
        let result: ListResourcesResult = self
            .call(METHOD_RESOURCES_LIST, None::<()>, timeout)
            .await?;
        Ok(result.resources)
    }

    /// Read one resource by URI.
    pub async fn read_resource(
        &self,
        uri: &str,
        timeout: Option<Duration>,
    ) -> Result<ReadResourceResult> {
        self.ensure_initialized()?;
        let params = ReadResourceParams {
            uri: uri.to_string(),
        };
        self.call(METHOD_RESOURCES_READ, Some(params), timeout)
            .await
    }

    /// List the server's prompts.
    pub async fn list_prompts(&self, timeout: Option<Duration>) -> Result<Vec<Prompt>> {
        self.ensure_initialized()?;
        let result: ListPromptsResult = self
            .call(METHOD_PROMPTS_LIST, None::<()>, timeout)
            .await?;
        Ok(result.prompts)
    }

    /// Render one prompt.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<Arguments>,
        timeout: Option<Duration>,
    ) -> Result<GetPromptResult> {
        self.ensure_initialized()?;
        let params = GetPromptParams {
            name: name.to_string(),
            arguments,
        };
        self.call(METHOD_PROMPTS_GET, Some(params), timeout).await
    }

    /// Round-trip a `ping` request.
    pub async fn ping(&self, timeout: Option<Duration>) -> Result<()> {
        self.ensure_initialized()?;
        let _: serde_json::Value = self.call(METHOD_PING, None::<()>, timeout).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Request cycle
    // -----------------------------------------------------------------------

    /// Send a request, wait for its response and decode the result.
    async fn call<P, R>(&self, method: &str, params: Option<P>, timeout: Option<Duration>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = params.map(serde_json::to_value).transpose()?;
        let response = self.send_request(method, params, timeout).await?;

        if let Some(error) = response.error {
            tracing::debug!(
                target: "mcp_navigator::mcp::client",
                method,
                code = error.code,
                "server returned error: {}",
                error.message
            );
            return Err(NavigatorError::Protocol {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        let result = response
            .result
            .ok_or_else(|| NavigatorError::InvalidResponse {
                method: method.to_string(),
                reason: "response carries neither result nor error".to_string(),
            })?;
        serde_json::from_value(result).map_err(|source| NavigatorError::Decode {
            context: format!("{} result", method),
            source,
        })
    }

    /// Send one request and read until the matching response arrives.
    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Option<Duration>,
    ) -> Result<Message> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        self.ensure_transport_alive().await?;

        let wait = self.bound(timeout);
        let deadline = Instant::now() + wait;
        let request = Message::request(id, method, params);

        tracing::debug!(
            target: "mcp_navigator::mcp::client",
            id,
            method,
            "sending request"
        );

        match tokio::time::timeout_at(deadline, self.transport.send(&request)).await {
            Err(_) => return Err(NavigatorError::timeout(method, wait)),
            Ok(Err(e)) => return Err(self.on_transport_error(e).await),
            Ok(Ok(())) => {}
        }

        loop {
            let message =
                match tokio::time::timeout_at(deadline, self.transport.receive()).await {
                    Err(_) => {
                        tracing::warn!(
                            target: "mcp_navigator::mcp::client",
                            id,
                            method,
                            "request timed out after {:?}",
                            wait
                        );
                        return Err(NavigatorError::timeout(method, wait));
                    }
                    Ok(Err(e)) => return Err(self.on_transport_error(e).await),
                    Ok(Ok(message)) => message,
                };

            if message.answers(id) {
                return Ok(message);
            }

            if message.is_notification() {
                tracing::debug!(
                    target: "mcp_navigator::mcp::client",
                    method = message.method.as_deref().unwrap_or_default(),
                    "ignoring notification while waiting for response {}",
                    id
                );
            } else {
                tracing::warn!(
                    target: "mcp_navigator::mcp::client",
                    expected = id,
                    received = ?message.id,
                    "discarding unrelated message"
                );
            }
        }
    }

    /// Transport failures end the session; timeouts do not.
    async fn on_transport_error(&self, error: NavigatorError) -> NavigatorError {
        if error.category() == ErrorCategory::Transport && !error.is_timeout() {
            self.force_disconnect(&error).await;
        }
        error
    }

    async fn force_disconnect(&self, cause: &NavigatorError) {
        {
            let mut session = self.write_session();
            if !session.connected {
                return;
            }
            *session = Session::default();
        }
        tracing::warn!(
            target: "mcp_navigator::mcp::client",
            endpoint = %self.transport.endpoint(),
            "transport failed, disconnecting: {}",
            cause
        );
        if let Err(e) = self.transport.close().await {
            tracing::warn!(
                target: "mcp_navigator::mcp::client",
                "closing failed transport: {}",
                e
            );
        }
    }

    async fn ensure_transport_alive(&self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        let error = NavigatorError::TransportNotConnected;
        self.force_disconnect(&error).await;
        Err(error)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.read_session().initialized {
            Ok(())
        } else {
            Err(NavigatorError::NotInitialized)
        }
    }

    fn bound(&self, timeout: Option<Duration>) -> Duration {
        timeout.map_or(self.config.timeout, |t| t.min(self.config.timeout))
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
