//! Command-line interface definition for mcp-navigator
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for discovery, one-shot inspection, tool calls and an
//! interactive session.

use clap::{Args, Parser, Subcommand};

/// mcp-navigator - explore and exercise MCP servers
///
/// Discover Model Context Protocol servers on the local machine and talk to
/// them over TCP, stdio, Docker or WebSocket.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-navigator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "MCP_NAVIGATOR_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Discover MCP servers on open ports and in containers
    Discover(DiscoverArgs),

    /// Connect, initialize and print what the server offers
    Connect(TransportArgs),

    /// Call a single tool and print its result
    Tool(ToolArgs),

    /// Start an interactive session with a server
    Interactive(TransportArgs),
}

/// Options for `discover`
#[derive(Args, Debug, Clone, Default)]
pub struct DiscoverArgs {
    /// Host to scan
    #[arg(long)]
    pub host: Option<String>,

    /// First port of the scanned range
    #[arg(long)]
    pub start_port: Option<u16>,

    /// Last port of the scanned range (inclusive)
    #[arg(long)]
    pub end_port: Option<u16>,

    /// Per-probe timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Only scan TCP ports
    #[arg(long, conflicts_with = "docker_only")]
    pub tcp_only: bool,

    /// Only look at Docker containers
    #[arg(long)]
    pub docker_only: bool,

    /// Test a connection to every discovered server
    #[arg(long)]
    pub test: bool,
}

/// How to reach a server
#[derive(Args, Debug, Clone, Default)]
pub struct TransportArgs {
    /// Transport type (tcp, stdio, docker, websocket)
    #[arg(long)]
    pub transport: Option<String>,

    /// Server host for tcp
    #[arg(long)]
    pub host: Option<String>,

    /// Server port for tcp and docker
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Command to spawn for stdio
    #[arg(long)]
    pub command: Option<String>,

    /// Arguments for the stdio command
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// WebSocket URL (ws:// or wss://)
    #[arg(long)]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Options for `tool`
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// Tool name
    #[arg(short, long)]
    pub name: String,

    /// Tool arguments as a JSON object
    #[arg(short, long)]
    pub arguments: Option<String>,

    /// Connection options
    #[command(flatten)]
    pub transport: TransportArgs,
}

impl Commands {
    /// Connection options carried by the command, if any.
    pub fn transport_args(&self) -> Option<&TransportArgs> {
        match self {
            Commands::Discover(_) => None,
            Commands::Connect(args) | Commands::Interactive(args) => Some(args),
            Commands::Tool(tool) => Some(&tool.transport),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            verbose: false,
            command: Commands::Discover(DiscoverArgs::default()),
        }
    }
}
