//! MCP server discovery
//!
//! [`Discovery`] produces [`ServerDescriptor`]s from three sources:
//!
//! 1. TCP port probing on a host, either a well-known port list or an
//!    explicit range;
//! 2. running containers whose name, image or published ports look like an
//!    MCP server, listed through a [`ContainerSource`];
//! 3. the fixed Docker MCP bridge entry on `localhost:8811`.
//!
//! Every descriptor carries a fresh, unconnected transport. Whoever takes
//! the descriptor owns that transport.
//!
//! [`Discovery::discover_all`] always appends the bridge entry last, even
//! when port probing already found the same endpoint.

use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::process::Command;

use crate::error::{NavigatorError, Result};
use crate::mcp::transport::{StdioTransport, TcpTransport, Transport};

/// Default bound for one probe or connection test.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Ports probed when no explicit range is given.
pub const WELL_KNOWN_PORTS: [u16; 8] = [8811, 8080, 3000, 4000, 5000, 8000, 8888, 9000];

/// Substrings that mark a container name or image as MCP related.
pub const CONTAINER_KEYWORDS: [&str; 3] = ["mcp", "model-context-protocol", "context"];

/// Published ports that mark a container as MCP related.
pub const CONTAINER_PORT_HINTS: [&str; 2] = ["8811", "3000"];

/// Host of the Docker MCP bridge.
pub const BRIDGE_HOST: &str = "localhost";

/// Port of the Docker MCP bridge.
pub const BRIDGE_PORT: u16 = 8811;

/// Default number of probes in flight.
pub const DEFAULT_CONCURRENCY: usize = 16;

const DOCKER_PS_FORMAT: &str = "{{.ID}}\t{{.Names}}\t{{.Image}}\t{{.Ports}}";

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Where a discovered server came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    /// Open TCP port.
    Tcp,
    /// Docker container or the Docker bridge.
    Docker,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerKind::Tcp => write!(f, "tcp"),
            ServerKind::Docker => write!(f, "docker"),
        }
    }
}

/// One discovery result.
#[derive(Debug)]
pub struct ServerDescriptor {
    /// Display name.
    pub name: String,
    /// Source tag.
    pub kind: ServerKind,
    /// Host name, address or container id.
    pub address: String,
    /// TCP port, zero when not applicable.
    pub port: u16,
    /// Unconnected transport for this server.
    pub transport: Box<dyn Transport>,
    /// Free-text description.
    pub description: String,
}

impl ServerDescriptor {
    /// `address:port`, or just the address when there is no port.
    pub fn location(&self) -> String {
        if self.port > 0 {
            format!("{}:{}", self.address, self.port)
        } else {
            self.address.clone()
        }
    }

    /// Hand over the attached transport.
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }

    fn tcp(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            name: format!("TCP Server {}:{}", host, port),
            kind: ServerKind::Tcp,
            address: host.to_string(),
            port,
            transport: Box::new(TcpTransport::new(host, port).with_timeout(timeout)),
            description: format!("MCP server on TCP {}:{}", host, port),
        }
    }

    fn container(container: &ContainerInfo) -> Self {
        Self {
            name: format!("Docker Container {}", container.name),
            kind: ServerKind::Docker,
            address: container.id.clone(),
            port: 0,
            transport: Box::new(StdioTransport::new(
                "docker",
                vec![
                    "exec".to_string(),
                    "-i".to_string(),
                    container.id.clone(),
                    "sh".to_string(),
                ],
            )),
            description: format!("MCP server in Docker container {}", container.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// A running container as reported by the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Container id.
    pub id: String,
    /// Container name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Published port mappings, verbatim.
    pub ports: Vec<String>,
}

impl ContainerInfo {
    /// Parse one `docker ps` line in `ID\tNAMES\tIMAGE\tPORTS` form.
    ///
    /// Returns `None` for lines with fewer than three fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_navigator::discovery::ContainerInfo;
    ///
    /// let c = ContainerInfo::parse_ps_line("abc\tweb\tnginx\t0.0.0.0:80->80/tcp, :::80->80/tcp")
    ///     .unwrap();
    /// assert_eq!(c.ports.len(), 2);
    /// ```
    pub fn parse_ps_line(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
        let id = fields.next()?.trim();
        let name = fields.next()?.trim();
        let image = fields.next()?.trim();
        if id.is_empty() {
            return None;
        }
        let ports = fields
            .next()
            .map(|p| {
                p.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            image: image.to_string(),
            ports,
        })
    }

    /// True when the name or image contains an MCP keyword, or a published
    /// port mentions a well-known MCP port.
    pub fn looks_like_mcp(&self) -> bool {
        let name = self.name.to_lowercase();
        let image = self.image.to_lowercase();
        if CONTAINER_KEYWORDS
            .iter()
            .any(|k| name.contains(k) || image.contains(k))
        {
            return true;
        }
        self.ports
            .iter()
            .any(|p| CONTAINER_PORT_HINTS.iter().any(|hint| p.contains(hint)))
    }
}

/// Something that can list running containers.
#[async_trait::async_trait]
pub trait ContainerSource: Send + Sync + fmt::Debug {
    /// Running containers; empty when the runtime is unavailable.
    async fn running_containers(&self) -> Result<Vec<ContainerInfo>>;
}

/// Lists containers through the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

impl DockerCli {
    /// Use a different executable, e.g. `podman`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn available(&self) -> bool {
        match Command::new(&self.program).arg("version").output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                tracing::debug!(
                    target: "mcp_navigator::discovery",
                    program = %self.program,
                    "container runtime not runnable: {}",
                    e
                );
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl ContainerSource for DockerCli {
    async fn running_containers(&self) -> Result<Vec<ContainerInfo>> {
        if !self.available().await {
            tracing::info!(
                target: "mcp_navigator::discovery",
                program = %self.program,
                "container runtime unavailable, skipping container discovery"
            );
            return Ok(Vec::new());
        }

        let output = Command::new(&self.program)
            .args(["ps", "--format", DOCKER_PS_FORMAT])
            .output()
            .await?;
        if !output.status.success() {
            return Err(NavigatorError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!(
                    "{} ps failed: {}",
                    self.program,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(ContainerInfo::parse_ps_line)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Discovery engine
// ---------------------------------------------------------------------------

/// Discovery settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Bound for each probe and connection test.
    pub timeout: Duration,
    /// Ports probed by [`Discovery::discover_common_ports`].
    pub well_known_ports: Vec<u16>,
    /// Probes in flight at once.
    pub concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            well_known_ports: WELL_KNOWN_PORTS.to_vec(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// MCP server discovery engine.
///
/// # Examples
///
/// ```no_run
/// use mcp_navigator::discovery::{Discovery, DiscoveryConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let discovery = Discovery::new(DiscoveryConfig::default());
/// for server in discovery.discover_all("localhost").await {
///     println!("{} ({}) {}", server.name, server.kind, server.location());
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct Discovery {
    config: DiscoveryConfig,
    containers: Box<dyn ContainerSource>,
}

impl Discovery {
    /// Create an engine that lists containers with the `docker` CLI.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            containers: Box::new(DockerCli::default()),
        }
    }

    /// Replace the container source.
    pub fn with_container_source(mut self, source: impl ContainerSource + 'static) -> Self {
        self.containers = Box::new(source);
        self
    }

    /// Change the probe and connection-test timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Probe and connection-test timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Probe `ports` on `host` and describe every open one, in `ports`
    /// order.
    pub async fn discover_tcp_servers(&self, host: &str, ports: &[u16]) -> Vec<ServerDescriptor> {
        tracing::debug!(
            target: "mcp_navigator::discovery",
            host,
            count = ports.len(),
            "probing tcp ports"
        );

        let open: Vec<u16> = stream::iter(ports.iter().copied())
            .map(|port| async move { self.probe(host, port).await.then_some(port) })
            .buffered(self.config.concurrency.max(1))
            .filter_map(|port| async move { port })
            .collect()
            .await;

        open.into_iter()
            .map(|port| {
                tracing::info!(
                    target: "mcp_navigator::discovery",
                    host,
                    port,
                    "found open port"
                );
                ServerDescriptor::tcp(host, port, self.config.timeout)
            })
            .collect()
    }

    /// Probe the configured well-known ports.
    pub async fn discover_common_ports(&self, host: &str) -> Vec<ServerDescriptor> {
        self.discover_tcp_servers(host, &self.config.well_known_ports)
            .await
    }

    /// Probe every port from `start` to `end`, inclusive.
    ///
    /// An inverted range yields nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_navigator::discovery::{Discovery, DiscoveryConfig};
    ///
    /// # tokio_test::block_on(async {
    /// let discovery = Discovery::new(DiscoveryConfig::default());
    /// assert!(discovery.scan_port_range("127.0.0.1", 9000, 8000).await.is_empty());
    /// # });
    /// ```
    pub async fn scan_port_range(&self, host: &str, start: u16, end: u16) -> Vec<ServerDescriptor> {
        if start > end {
            return Vec::new();
        }
        let ports: Vec<u16> = (start..=end).collect();
        self.discover_tcp_servers(host, &ports).await
    }

    /// Describe every running container that looks like an MCP server.
    ///
    /// # Errors
    ///
    /// Propagates failures of the container source.
    pub async fn discover_containers(&self) -> Result<Vec<ServerDescriptor>> {
        let containers = self.containers.running_containers().await?;
        Ok(containers
            .iter()
            .filter(|c| c.looks_like_mcp())
            .map(|c| {
                tracing::info!(
                    target: "mcp_navigator::discovery",
                    id = %c.id,
                    name = %c.name,
                    image = %c.image,
                    "found candidate container"
                );
                ServerDescriptor::container(c)
            })
            .collect())
    }

    /// The fixed Docker MCP bridge entry.
    pub fn bridge_descriptor(&self) -> ServerDescriptor {
        ServerDescriptor {
            name: "Docker MCP (Direct TCP)".to_string(),
            kind: ServerKind::Docker,
            address: BRIDGE_HOST.to_string(),
            port: BRIDGE_PORT,
            transport: Box::new(
                TcpTransport::new(BRIDGE_HOST, BRIDGE_PORT).with_timeout(self.config.timeout),
            ),
            description: format!(
                "Standard Docker MCP server using direct TCP connection to {}:{}",
                BRIDGE_HOST, BRIDGE_PORT
            ),
        }
    }

    /// Well-known ports, then containers, then the bridge entry.
    ///
    /// Container failures are logged and skipped.
    pub async fn discover_all(&self, host: &str) -> Vec<ServerDescriptor> {
        tracing::info!(
            target: "mcp_navigator::discovery",
            host,
            "starting comprehensive discovery"
        );

        let mut servers = self.discover_common_ports(host).await;
        match self.discover_containers().await {
            Ok(found) => servers.extend(found),
            Err(e) => tracing::warn!(
                target: "mcp_navigator::discovery",
                "container discovery failed: {}",
                e
            ),
        }
        servers.push(self.bridge_descriptor());

        tracing::info!(
            target: "mcp_navigator::discovery",
            count = servers.len(),
            "discovery complete"
        );
        servers
    }

    /// Connect and immediately close the descriptor's transport.
    ///
    /// Only checks reachability; no handshake is performed.
    pub async fn test_connection(&self, server: &ServerDescriptor) -> bool {
        let timeout = self.config.timeout;
        let outcome = tokio::time::timeout(timeout, server.transport.connect(timeout)).await;
        let reachable = matches!(outcome, Ok(Ok(())));

        match outcome {
            Ok(Ok(())) => tracing::info!(
                target: "mcp_navigator::discovery",
                server = %server.name,
                "connection test succeeded"
            ),
            Ok(Err(e)) => tracing::info!(
                target: "mcp_navigator::discovery",
                server = %server.name,
                "connection test failed: {}",
                e
            ),
            Err(_) => tracing::info!(
                target: "mcp_navigator::discovery",
                server = %server.name,
                "connection test timed out after {:?}",
                timeout
            ),
        }

        if let Err(e) = server.transport.close().await {
            tracing::debug!(
                target: "mcp_navigator::discovery",
                server = %server.name,
                "close after connection test failed: {}",
                e
            );
        }
        reachable
    }

    async fn probe(&self, host: &str, port: u16) -> bool {
        matches!(
            tokio::time::timeout(self.config.timeout, TcpStream::connect((host, port))).await,
            Ok(Ok(_))
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
