//! Configuration management for mcp-navigator
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! The resulting [`Config`] is plain data. It is converted into the
//! library's own settings types ([`ClientConfig`], [`DiscoveryConfig`],
//! [`TransportSpec`]) and passed to constructors explicitly.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands, DiscoverArgs, TransportArgs};
use crate::discovery::{DiscoveryConfig, DEFAULT_CONCURRENCY, WELL_KNOWN_PORTS};
use crate::error::{NavigatorError, Result};
use crate::mcp::client::ClientConfig;
use crate::mcp::transport::TransportSpec;
use crate::mcp::types::ClientCapabilities;

/// Transports accepted in `connection.transport`.
pub const VALID_TRANSPORTS: [&str; 4] = ["tcp", "stdio", "docker", "websocket"];

/// Image used by the `docker` transport to bridge stdio to TCP.
pub const SOCAT_IMAGE: &str = "alpine/socat";

/// Host name containers use to reach the Docker host.
pub const DOCKER_HOST_GATEWAY: &str = "host.docker.internal";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Client identity and request timeout
    #[serde(default)]
    pub client: ClientSettings,
    /// Default server connection
    #[serde(default)]
    pub connection: ConnectionSettings,
    /// Discovery behavior
    #[serde(default)]
    pub discovery: DiscoverySettings,
}

/// Client identity sent during the handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Client name
    #[serde(default = "default_client_name")]
    pub name: String,

    /// Client version
    #[serde(default = "default_client_version")]
    pub version: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

fn default_client_name() -> String {
    "mcp-navigator".to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            name: default_client_name(),
            version: default_client_version(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// How to reach the server for `connect`, `tool` and `interactive`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Transport type: tcp, stdio, docker or websocket
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Host for tcp
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for tcp and docker
    #[serde(default = "default_port")]
    pub port: u16,

    /// Command for stdio
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments for the stdio command
    #[serde(default)]
    pub args: Vec<String>,

    /// URL for websocket
    #[serde(default)]
    pub url: Option<String>,
}

fn default_transport() -> String {
    "tcp".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8811
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            host: default_host(),
            port: default_port(),
            command: None,
            args: Vec::new(),
            url: None,
        }
    }
}

/// Discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    /// Host to probe
    #[serde(default = "default_host")]
    pub host: String,

    /// Probe timeout (seconds)
    #[serde(default = "default_discovery_timeout")]
    pub timeout_seconds: u64,

    /// Ports probed by a full discovery
    #[serde(default = "default_well_known_ports")]
    pub well_known_ports: Vec<u16>,

    /// First port of the `--tcp-only` range
    #[serde(default = "default_start_port")]
    pub start_port: u16,

    /// Last port of the `--tcp-only` range (inclusive)
    #[serde(default = "default_end_port")]
    pub end_port: u16,

    /// Probes in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_discovery_timeout() -> u64 {
    5
}

fn default_well_known_ports() -> Vec<u16> {
    WELL_KNOWN_PORTS.to_vec()
}

fn default_start_port() -> u16 {
    8810
}

fn default_end_port() -> u16 {
    8820
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            timeout_seconds: default_discovery_timeout(),
            well_known_ports: default_well_known_ports(),
            start_port: default_start_port(),
            end_port: default_end_port(),
            concurrency: default_concurrency(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file, `None` to start from defaults
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&str>, cli: &Cli) -> Result<Self> {
        let mut config = match path {
            Some(path) if Path::new(path).exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!("Config file not found at {}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| NavigatorError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| NavigatorError::Config(format!("Failed to parse config: {}", e)))
    }

    fn apply_env_vars(&mut self) {
        // Client overrides
        if let Ok(name) = std::env::var("MCP_NAVIGATOR_CLIENT_NAME") {
            self.client.name = name;
        }

        if let Ok(timeout) = std::env::var("MCP_NAVIGATOR_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.client.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MCP_NAVIGATOR_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        // Connection overrides
        if let Ok(transport) = std::env::var("MCP_NAVIGATOR_TRANSPORT") {
            self.connection.transport = transport.to_lowercase();
        }

        if let Ok(host) = std::env::var("MCP_NAVIGATOR_HOST") {
            self.connection.host = host;
        }

        if let Ok(port) = std::env::var("MCP_NAVIGATOR_PORT") {
            if let Ok(value) = port.parse() {
                self.connection.port = value;
            } else {
                tracing::warn!("Invalid MCP_NAVIGATOR_PORT: {}", port);
            }
        }

        if let Ok(command) = std::env::var("MCP_NAVIGATOR_COMMAND") {
            self.connection.command = Some(command);
        }

        if let Ok(args) = std::env::var("MCP_NAVIGATOR_ARGS") {
            self.connection.args = args.split_whitespace().map(String::from).collect();
        }

        if let Ok(url) = std::env::var("MCP_NAVIGATOR_URL") {
            self.connection.url = Some(url);
        }

        // Discovery overrides
        if let Ok(host) = std::env::var("MCP_NAVIGATOR_DISCOVERY_HOST") {
            self.discovery.host = host;
        }

        if let Ok(timeout) = std::env::var("MCP_NAVIGATOR_DISCOVERY_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.discovery.timeout_seconds = value;
            } else {
                tracing::warn!(
                    "Invalid MCP_NAVIGATOR_DISCOVERY_TIMEOUT_SECONDS: {}",
                    timeout
                );
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        match &cli.command {
            Commands::Discover(args) => self.apply_discover_args(args),
            Commands::Connect(args) | Commands::Interactive(args) => {
                self.apply_transport_args(args)
            }
            Commands::Tool(tool) => self.apply_transport_args(&tool.transport),
        }
    }

    fn apply_discover_args(&mut self, args: &DiscoverArgs) {
        if let Some(host) = &args.host {
            self.discovery.host = host.clone();
        }
        if let Some(start) = args.start_port {
            self.discovery.start_port = start;
        }
        if let Some(end) = args.end_port {
            self.discovery.end_port = end;
        }
        if let Some(timeout) = args.timeout {
            self.discovery.timeout_seconds = timeout;
        }
    }

    fn apply_transport_args(&mut self, args: &TransportArgs) {
        if let Some(transport) = &args.transport {
            self.connection.transport = transport.to_lowercase();
        }
        if let Some(host) = &args.host {
            self.connection.host = host.clone();
        }
        if let Some(port) = args.port {
            self.connection.port = port;
        }
        if let Some(command) = &args.command {
            self.connection.command = Some(command.clone());
        }
        if !args.args.is_empty() {
            self.connection.args = args.args.clone();
        }
        if let Some(url) = &args.url {
            self.connection.url = Some(url.clone());
        }
        if let Some(timeout) = args.timeout {
            self.client.timeout_seconds = timeout;
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError::Config`] if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.client.name.trim().is_empty() {
            return Err(NavigatorError::Config(
                "client.name cannot be empty".to_string(),
            ));
        }

        if self.client.timeout_seconds == 0 {
            return Err(NavigatorError::Config(
                "client.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        let transport = self.connection.transport.as_str();
        if !VALID_TRANSPORTS.contains(&transport) {
            return Err(NavigatorError::Config(format!(
                "Invalid transport type: {}. Must be one of: {}",
                transport,
                VALID_TRANSPORTS.join(", ")
            )));
        }

        if matches!(transport, "tcp" | "docker") && self.connection.port == 0 {
            return Err(NavigatorError::Config(
                "connection.port must be greater than 0".to_string(),
            ));
        }

        if transport == "stdio"
            && self
                .connection
                .command
                .as_deref()
                .map_or(true, |c| c.trim().is_empty())
        {
            return Err(NavigatorError::Config(
                "connection.command is required for the stdio transport".to_string(),
            ));
        }

        if transport == "websocket" && self.connection.url.is_none() {
            return Err(NavigatorError::Config(
                "connection.url is required for the websocket transport".to_string(),
            ));
        }

        if self.discovery.timeout_seconds == 0 {
            return Err(NavigatorError::Config(
                "discovery.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.discovery.start_port == 0 || self.discovery.end_port == 0 {
            return Err(NavigatorError::Config(
                "discovery ports must be greater than 0".to_string(),
            ));
        }

        if self.discovery.start_port > self.discovery.end_port {
            return Err(NavigatorError::Config(format!(
                "discovery.start_port ({}) must not exceed discovery.end_port ({})",
                self.discovery.start_port, self.discovery.end_port
            )));
        }

        if self.discovery.concurrency == 0 {
            return Err(NavigatorError::Config(
                "discovery.concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_seconds)
    }

    /// Client settings for [`crate::mcp::McpClient`].
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            name: self.client.name.clone(),
            version: self.client.version.clone(),
            timeout: self.request_timeout(),
            capabilities: ClientCapabilities::default(),
        }
    }

    /// Settings for [`crate::discovery::Discovery`].
    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            timeout: Duration::from_secs(self.discovery.timeout_seconds),
            well_known_ports: self.discovery.well_known_ports.clone(),
            concurrency: self.discovery.concurrency,
        }
    }

    /// Transport description for the configured connection.
    ///
    /// `docker` becomes a stdio transport running a socat container that
    /// forwards to the configured port on the Docker host.
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError::Config`] when the fields the transport
    /// needs are missing or the transport type is unknown.
    pub fn transport_spec(&self) -> Result<TransportSpec> {
        let conn = &self.connection;
        match conn.transport.as_str() {
            "tcp" => Ok(TransportSpec::Tcp {
                host: conn.host.clone(),
                port: conn.port,
            }),
            "stdio" => {
                let command = conn.command.clone().ok_or_else(|| {
                    NavigatorError::Config(
                        "connection.command is required for the stdio transport".to_string(),
                    )
                })?;
                Ok(TransportSpec::Stdio {
                    command,
                    args: conn.args.clone(),
                })
            }
            "docker" => Ok(docker_socat_spec(conn.port)),
            "websocket" => {
                let url = conn.url.clone().ok_or_else(|| {
                    NavigatorError::Config(
                        "connection.url is required for the websocket transport".to_string(),
                    )
                })?;
                Ok(TransportSpec::WebSocket { url })
            }
            other => Err(NavigatorError::Config(format!(
                "Invalid transport type: {}. Must be one of: {}",
                other,
                VALID_TRANSPORTS.join(", ")
            ))),
        }
    }
}

/// Stdio transport that reaches `host.docker.internal:<port>` through a
/// throwaway `alpine/socat` container.
pub fn docker_socat_spec(port: u16) -> TransportSpec {
    TransportSpec::Stdio {
        command: "docker".to_string(),
        args: vec![
            "run".to_string(),
            "-i".to_string(),
            "--rm".to_string(),
            SOCAT_IMAGE.to_string(),
            "STDIO".to_string(),
            format!("TCP:{}:{}", DOCKER_HOST_GATEWAY, port),
        ],
    }
}
