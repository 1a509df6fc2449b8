//! `tool` command handler

use anyhow::Result;
use colored::Colorize;

use crate::cli::ToolArgs;
use crate::commands::{open_client, parse_arguments, print_content};
use crate::config::Config;
use crate::mcp::client::McpClient;

/// Call one tool and print its result
///
/// Arguments are parsed before connecting, so malformed JSON never reaches
/// the server. The client is disconnected on every path once connected.
///
/// # Arguments
///
/// * `config` - Configuration with CLI overrides already applied
/// * `args` - Tool name and raw JSON arguments
///
/// # Errors
///
/// Returns an error for invalid arguments, connection failures, protocol
/// errors and tool results flagged as errors.
pub async fn run_tool(config: &Config, args: &ToolArgs) -> Result<()> {
    let arguments = parse_arguments(args.arguments.as_deref())?;
    let client = open_client(config).await?;

    let outcome = call(&client, &args.name, arguments).await;

    if let Err(e) = client.disconnect().await {
        tracing::warn!("Error during disconnect: {}", e);
    }
    outcome
}

async fn call(
    client: &McpClient,
    name: &str,
    arguments: Option<crate::mcp::types::Arguments>,
) -> Result<()> {
    println!("{} Calling tool: {}", "🔧".cyan(), name.bold());
    let result = client.call_tool(name, arguments, None).await?;

    if result.is_error {
        println!("{}", "⚠️  Tool returned an error:".yellow());
        print_content(&result.content);
        anyhow::bail!("Tool '{}' reported an error", name);
    }

    println!("{}", "📤 Tool result:".green());
    print_content(&result.content);
    Ok(())
}
