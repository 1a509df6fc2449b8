/*!
Subcommand handlers for `mcp-navigator`

Each submodule backs one CLI subcommand:

- `discover`: find MCP servers on local ports and in containers
- `connect`: initialize a session and print what the server offers
- `tool`: call a single tool and print its content
- `interactive`: readline session against one server at a time

`shell` holds the interactive command parser. The helpers below open a
ready-to-use client from a [`Config`](crate::config::Config) and render
protocol results as tables.
*/

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;
use crate::mcp::client::McpClient;
use crate::mcp::transport::Transport;
use crate::mcp::types::{Arguments, Content, Prompt, Resource, Tool};

pub mod connect;
pub mod discover;
pub mod interactive;
pub mod shell;
pub mod tool;

/// Build a client for the configured connection, connect and initialize it.
///
/// Prints progress the way every connection-oriented command does. On an
/// initialization failure the client is disconnected before returning.
///
/// # Errors
///
/// Returns an error if the transport cannot be built, the connection fails
/// or the server rejects the handshake.
pub async fn open_client(config: &Config) -> Result<McpClient> {
    let spec = config.transport_spec()?;
    println!(
        "{} Connecting to MCP server using {} transport...",
        "🔌".cyan(),
        config.connection.transport
    );
    println!("   Endpoint: {}", spec);

    let transport = spec.build(config.request_timeout())?;
    open_client_with(transport, config).await
}

/// Connect and initialize a client over an already built transport.
///
/// # Errors
///
/// Returns an error if connecting or the handshake fails.
pub async fn open_client_with(transport: Box<dyn Transport>, config: &Config) -> Result<McpClient> {
    let client = McpClient::new(transport, config.client_config());

    client
        .connect(None)
        .await
        .with_context(|| format!("Failed to connect to {}", client.endpoint()))?;

    if let Err(e) = client.initialize(client.config().client_info(), None).await {
        if let Err(close_err) = client.disconnect().await {
            tracing::warn!("Disconnect after failed initialize: {}", close_err);
        }
        return Err(e).context("Failed to initialize MCP protocol");
    }

    println!("{}", "✅ Connected and initialized MCP protocol".green());
    if let Some(info) = client.server_info() {
        println!("🚀 Server: {} {}", info.name.bold(), info.version);
    }
    Ok(client)
}

/// Parse a JSON object given on the command line.
///
/// Empty input means no arguments.
///
/// # Errors
///
/// Returns an error when the text is not valid JSON or not an object.
///
/// # Examples
///
/// ```
/// use mcp_navigator::commands::parse_arguments;
///
/// let args = parse_arguments(Some(r#"{"query":"golang"}"#)).unwrap().unwrap();
/// assert_eq!(args["query"], "golang");
/// assert!(parse_arguments(None).unwrap().is_none());
/// ```
pub fn parse_arguments(raw: Option<&str>) -> Result<Option<Arguments>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("Invalid JSON arguments: {}", raw))?;
    match value {
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => anyhow::bail!("Tool arguments must be a JSON object, got: {}", other),
    }
}

/// Print a numbered tool list.
pub fn print_tools(tools: &[Tool]) {
    if tools.is_empty() {
        println!("   No tools available");
        return;
    }
    println!("{}", format!("📝 Available tools ({}):", tools.len()).green());
    for (i, tool) in tools.iter().enumerate() {
        println!("  {}. {}", i + 1, tool.name.bold());
        if let Some(description) = tool.description.as_deref().filter(|d| !d.is_empty()) {
            println!("     Description: {}", description);
        }
    }
}

/// Print a numbered resource list.
pub fn print_resources(resources: &[Resource]) {
    if resources.is_empty() {
        println!("   No resources available");
        return;
    }
    println!(
        "{}",
        format!("📄 Available resources ({}):", resources.len()).green()
    );
    for (i, resource) in resources.iter().enumerate() {
        println!("  {}. {}", i + 1, resource.name.bold());
        if let Some(description) = resource.description.as_deref().filter(|d| !d.is_empty()) {
            println!("     Description: {}", description);
        }
        if !resource.uri.is_empty() {
            println!("     URI: {}", resource.uri);
        }
    }
}

/// Print a numbered prompt list with argument names.
pub fn print_prompts(prompts: &[Prompt]) {
    if prompts.is_empty() {
        println!("   No prompts available");
        return;
    }
    println!("{}", format!("💬 Available prompts ({}):", prompts.len()).green());
    for (i, prompt) in prompts.iter().enumerate() {
        println!("  {}. {}", i + 1, prompt.name.bold());
        if let Some(description) = prompt.description.as_deref().filter(|d| !d.is_empty()) {
            println!("     Description: {}", description);
        }
        if !prompt.arguments.is_empty() {
            let args: Vec<String> = prompt
                .arguments
                .iter()
                .map(|a| {
                    if a.required {
                        format!("{}*", a.name)
                    } else {
                        a.name.clone()
                    }
                })
                .collect();
            println!("     Arguments: {}", args.join(", "));
        }
    }
}

/// Print content items: text verbatim, everything else summarized.
pub fn print_content(items: &[Content]) {
    for item in items {
        match item {
            Content::Text { text, .. } => println!("{}", text),
            Content::Image {
                data, mime_type, ..
            } => println!(
                "Content type: image ({}, {} bytes base64)",
                mime_type,
                data.len()
            ),
            Content::Other {
                content_type,
                text,
                data,
                uri,
                blob,
                ..
            } => {
                let label = if content_type.is_empty() {
                    "resource"
                } else {
                    content_type.as_str()
                };
                println!("Content type: {}", label);
                if let Some(uri) = uri {
                    println!("URI: {}", uri);
                }
                if let Some(text) = text {
                    println!("{}", text);
                }
                if let Some(data) = data {
                    println!("Data: {}", data);
                }
                if let Some(blob) = blob {
                    println!("Blob: {} bytes base64", blob.len());
                }
            }
        }
    }
}
