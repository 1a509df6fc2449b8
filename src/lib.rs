//! mcp-navigator - Model Context Protocol client library
//!
//! This library provides a client engine for MCP servers: a JSON-RPC 2.0
//! wire model, interchangeable transports, a protocol client with request
//! correlation, and a discovery engine that finds servers on local ports
//! and in containers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `mcp::types`: Wire model (messages, handshake, tools, resources, prompts)
//! - `mcp::transport`: Transport trait with TCP, stdio and WebSocket variants
//! - `mcp::client`: Protocol client state machine and high-level operations
//! - `discovery`: Port probing, container listing and the Docker bridge entry
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and its handlers
//!
//! # Example
//!
//! ```no_run
//! use mcp_navigator::McpClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = McpClient::builder().tcp("localhost", 8811).build()?;
//!     client.connect(None).await?;
//!     client.initialize(client.config().client_info(), None).await?;
//!
//!     for tool in client.list_tools(None).await? {
//!         println!("{}", tool.name);
//!     }
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod mcp;

// Re-export commonly used types
pub use config::Config;
pub use discovery::{Discovery, DiscoveryConfig, ServerDescriptor, ServerKind};
pub use error::{NavigatorError, Result};
pub use mcp::{ClientBuilder, ClientConfig, McpClient};
