//! MCP (Model Context Protocol) client support
//!
//! Targets protocol revision **2024-11-05**.
//!
//! # Module Layout
//!
//! - `types`     -- wire model: JSON-RPC envelope and MCP data structures
//! - `transport` -- `Transport` trait with TCP, stdio and WebSocket variants
//! - `client`    -- session state machine, handshake and request correlation
//! - `builder`   -- fluent `McpClient` construction

pub mod builder;
pub mod client;
pub mod transport;
pub mod types;

pub use builder::ClientBuilder;
pub use client::{ClientConfig, McpClient};
