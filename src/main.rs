//! mcp-navigator - explore and exercise MCP servers
//!
#![doc = "mcp-navigator - explore and exercise MCP servers"]
#![doc = "Main entry point for the mcp-navigator application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcp_navigator::cli::{Cli, Commands};
use mcp_navigator::commands;
use mcp_navigator::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config = Config::load(cli.config.as_deref(), &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match &cli.command {
        Commands::Discover(args) => {
            tracing::info!("Starting discovery");
            commands::discover::run_discover(&config, args).await
        }
        Commands::Connect(_) => {
            tracing::info!("Connecting to {}", config.connection.transport);
            commands::connect::run_connect(&config).await
        }
        Commands::Tool(args) => {
            tracing::info!("Calling tool {}", args.name);
            commands::tool::run_tool(&config, args).await
        }
        Commands::Interactive(_) => {
            tracing::info!("Starting interactive mode");
            commands::interactive::run_interactive(config).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "mcp_navigator=debug"
    } else {
        "mcp_navigator=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
