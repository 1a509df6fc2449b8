//! `connect` command handler
//!
//! Connects to one server, prints its identity and capabilities, lists what
//! it offers and disconnects again.

use anyhow::Result;
use colored::Colorize;

use crate::commands::{open_client, print_prompts, print_resources, print_tools};
use crate::config::Config;
use crate::mcp::client::McpClient;

/// Connect, inspect and disconnect
///
/// Listing failures are printed and do not abort the command; each
/// capability block is listed only when the server declared it.
///
/// # Errors
///
/// Returns an error if the connection or the handshake fails.
pub async fn run_connect(config: &Config) -> Result<()> {
    let client = open_client(config).await?;
    inspect(&client).await;

    println!("\n{} Disconnecting...", "🔌".cyan());
    match client.disconnect().await {
        Ok(()) => println!("{}", "✅ Disconnected successfully".green()),
        Err(e) => println!("{}", format!("❌ Error during disconnect: {}", e).red()),
    }
    Ok(())
}

/// Print capabilities and the tool, resource and prompt lists.
pub async fn inspect(client: &McpClient) {
    let capabilities = client.server_capabilities().unwrap_or_default();
    let declared = capabilities.declared();
    if declared.is_empty() {
        println!("   Capabilities: none declared");
    } else {
        println!("   Capabilities: {}", declared.join(", "));
    }

    if capabilities.tools.is_some() {
        println!("\n📋 Listing available tools...");
        match client.list_tools(None).await {
            Ok(tools) => print_tools(&tools),
            Err(e) => println!("{}", format!("❌ Failed to list tools: {}", e).red()),
        }
    }

    if capabilities.resources.is_some() {
        println!("\n📂 Listing available resources...");
        match client.list_resources(None).await {
            Ok(resources) => print_resources(&resources),
            Err(e) => println!("{}", format!("❌ Failed to list resources: {}", e).red()),
        }
    }

    if capabilities.prompts.is_some() {
        println!("\n💬 Listing available prompts...");
        match client.list_prompts(None).await {
            Ok(prompts) => print_prompts(&prompts),
            Err(e) => println!("{}", format!("❌ Failed to list prompts: {}", e).red()),
        }
    }
}
