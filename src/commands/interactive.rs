//! Interactive session handler.
//!
//! Tries the configured connection first, then runs a readline loop. The
//! user can discover servers, switch between them and exercise tools,
//! resources and prompts on the current one. Command failures are printed
//! and the prompt comes back.

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::commands::shell::{parse_command, print_help, ServerSelector, ShellCommand};
use crate::commands::{
    open_client, open_client_with, parse_arguments, print_content, print_prompts,
    print_resources, print_tools,
};
use crate::config::Config;
use crate::discovery::{Discovery, ServerDescriptor};
use crate::mcp::client::McpClient;

/// Start the interactive session
///
/// # Arguments
///
/// * `config` - Configuration with CLI overrides already applied
///
/// # Errors
///
/// Returns an error only if the line editor cannot be created or its
/// history cannot be updated.
pub async fn run_interactive(config: Config) -> Result<()> {
    let mut session = Session::new(config);

    println!("{}", "🚀 MCP Navigator Interactive Mode".green().bold());
    println!("{}", "Type 'help' for available commands.".cyan());

    match open_client(&session.config).await {
        Ok(client) => {
            session.current = Some(client.endpoint());
            session.client = Some(client);
        }
        Err(e) => {
            println!("{}", format!("❌ {:#}", e).red());
            println!("Use 'discover' and 'connect <n>' to pick a server.");
        }
    }

    let mut rl = DefaultEditor::new()?;

    loop {
        let prompt = match &session.current {
            Some(name) => format!("mcp[{}]> ", name),
            None => "mcp> ".to_string(),
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", format!("❌ {}", e).red());
                        continue;
                    }
                };

                if command == ShellCommand::Exit {
                    break;
                }

                if let Err(e) = session.execute(command).await {
                    println!("{}", format!("❌ {:#}", e).red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(e) => {
                println!("{}", format!("Error reading input: {}", e).red());
                break;
            }
        }
    }

    println!("\n{}", "👋 Shutting down MCP client...".cyan());
    session.disconnect().await;
    println!("{}", "✅ Goodbye!".green());
    Ok(())
}

/// State of one interactive session.
struct Session {
    config: Config,
    discovery: Discovery,
    servers: Vec<ServerDescriptor>,
    client: Option<McpClient>,
    current: Option<String>,
}

impl Session {
    fn new(config: Config) -> Self {
        let discovery = Discovery::new(config.discovery_config());
        Self {
            config,
            discovery,
            servers: Vec::new(),
            client: None,
            current: None,
        }
    }

    fn client(&self) -> Result<&McpClient> {
        self.client
            .as_ref()
            .context("No active connection. Use 'connect' first.")
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Help => print_help(),
            ShellCommand::Discover => self.discover().await,
            ShellCommand::Connect(selector) => self.connect(selector).await?,
            ShellCommand::Disconnect => {
                if self.client.is_none() {
                    anyhow::bail!("No active connection");
                }
                self.disconnect().await;
            }
            ShellCommand::Status => self.status().await,
            ShellCommand::ListTools => print_tools(&self.client()?.list_tools(None).await?),
            ShellCommand::CallTool { name, arguments } => {
                let arguments = parse_arguments(arguments.as_deref())?;
                let client = self.client()?;
                println!("{} Calling tool: {}", "🔧".cyan(), name.bold());
                let result = client.call_tool(&name, arguments, None).await?;
                if result.is_error {
                    println!("{}", "⚠️  Tool returned an error:".yellow());
                } else {
                    println!("{}", "📤 Tool result:".green());
                }
                print_content(&result.content);
            }
            ShellCommand::ListResources => {
                print_resources(&self.client()?.list_resources(None).await?)
            }
            ShellCommand::ReadResource(uri) => {
                let result = self.client()?.read_resource(&uri, None).await?;
                print_content(&result.contents);
            }
            ShellCommand::ListPrompts => print_prompts(&self.client()?.list_prompts(None).await?),
            ShellCommand::GetPrompt { name, arguments } => {
                let arguments = parse_arguments(arguments.as_deref())?;
                let result = self.client()?.get_prompt(&name, arguments, None).await?;
                if let Some(description) = &result.description {
                    println!("{}", description.italic());
                }
                for message in &result.messages {
                    println!("[{}]", message.role.to_string().bold());
                    print_content(std::slice::from_ref(&message.content));
                }
            }
            ShellCommand::Ping => {
                self.client()?.ping(None).await?;
                println!("{}", "✅ pong".green());
            }
            ShellCommand::Exit | ShellCommand::None => {}
        }
        Ok(())
    }

    async fn discover(&mut self) {
        println!("{} Discovering MCP servers...", "🔍".cyan());
        self.servers = self
            .discovery
            .discover_all(&self.config.discovery.host)
            .await;

        println!(
            "{}",
            format!("✅ Found {} server(s):", self.servers.len()).green()
        );
        for (i, server) in self.servers.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, server.name, server.kind);
            println!("     Address: {}", server.location());
        }
    }

    async fn connect(&mut self, selector: ServerSelector) -> Result<()> {
        if self.servers.is_empty() {
            anyhow::bail!("No servers available. Run 'discover' first.");
        }

        let index = match &selector {
            ServerSelector::Index(n) => Some(n - 1).filter(|i| *i < self.servers.len()),
            ServerSelector::Name(name) => self
                .servers
                .iter()
                .position(|s| s.name.eq_ignore_ascii_case(name)),
        }
        .context("Server not found")?;

        self.disconnect().await;

        let server = self.servers.remove(index);
        let name = server.name.clone();
        println!("{} Connecting to {}...", "🔌".cyan(), name);
        let client = open_client_with(server.into_transport(), &self.config).await?;

        println!("{}", format!("✅ Connected to {}", name).green());
        self.client = Some(client);
        self.current = Some(name);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            match client.disconnect().await {
                Ok(()) => {
                    if let Some(name) = &self.current {
                        println!("{}", format!("🔌 Disconnected from {}", name).green());
                    }
                }
                Err(e) => println!("{}", format!("❌ Error during disconnect: {}", e).red()),
            }
        }
        self.current = None;
    }

    async fn status(&self) {
        if let Some(client) = &self.client {
            if let Err(e) = client.check_connection().await {
                tracing::debug!(
                    target: "mcp_navigator::commands::interactive",
                    "connection check: {}",
                    e
                );
            }
        }
        println!("\n📊 Status:");
        println!("  Discovered servers: {}", self.servers.len());
        match (&self.client, &self.current) {
            (Some(client), Some(name)) if client.is_connected() => {
                println!("  Current connection: {} ✅", name);
                if let Some(info) = client.server_info() {
                    println!("  Server info: {} {}", info.name, info.version);
                }
                if let Some(capabilities) = client.server_capabilities() {
                    println!("  Capabilities: {}", capabilities.declared().join(", "));
                }
            }
            (Some(_), Some(name)) => println!("  Current connection: {} (lost) ❌", name),
            _ => println!("  Current connection: None ❌"),
        }
    }
}
