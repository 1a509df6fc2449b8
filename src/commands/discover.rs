//! `discover` command handler
//!
//! Runs the discovery engine with the configured settings and prints the
//! results as a table, optionally testing a connection to each one.

use anyhow::Result;
use colored::Colorize;
use prettytable::{cell, row, Table};

use crate::cli::DiscoverArgs;
use crate::config::{docker_socat_spec, Config, DOCKER_HOST_GATEWAY};
use crate::discovery::{Discovery, ServerDescriptor, ServerKind, BRIDGE_PORT};

/// Which sources a discovery run consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Well-known ports, containers and the bridge entry.
    All,
    /// Only the configured port range.
    TcpOnly,
    /// Only containers, plus the socat bridge entry.
    DockerOnly,
}

impl DiscoveryMode {
    /// Pick the mode from the command flags.
    ///
    /// # Errors
    ///
    /// Returns an error when both exclusive flags are set.
    pub fn from_args(args: &DiscoverArgs) -> Result<Self> {
        match (args.tcp_only, args.docker_only) {
            (true, true) => anyhow::bail!("Cannot specify both --tcp-only and --docker-only"),
            (true, false) => Ok(Self::TcpOnly),
            (false, true) => Ok(Self::DockerOnly),
            (false, false) => Ok(Self::All),
        }
    }
}

/// Run a discovery and print the results
///
/// # Arguments
///
/// * `config` - Configuration with CLI overrides already applied
/// * `args` - Flags of the `discover` command
///
/// # Errors
///
/// Returns an error for conflicting flags or a failing container listing in
/// `--docker-only` mode.
pub async fn run_discover(config: &Config, args: &DiscoverArgs) -> Result<()> {
    let mode = DiscoveryMode::from_args(args)?;
    let discovery = Discovery::new(config.discovery_config());
    let servers = discover(&discovery, config, mode).await?;

    if servers.is_empty() {
        println!("{}", "❌ No MCP servers discovered".red());
        return Ok(());
    }

    let reachable = if args.test {
        let mut results = Vec::with_capacity(servers.len());
        for server in &servers {
            results.push(Some(discovery.test_connection(server).await));
        }
        results
    } else {
        vec![None; servers.len()]
    };

    println!(
        "{}",
        format!("✅ Found {} MCP server(s):", servers.len()).green()
    );
    print_servers(&servers, &reachable);
    Ok(())
}

/// Collect descriptors for `mode`.
///
/// # Errors
///
/// Propagates container listing failures in [`DiscoveryMode::DockerOnly`].
pub async fn discover(
    discovery: &Discovery,
    config: &Config,
    mode: DiscoveryMode,
) -> Result<Vec<ServerDescriptor>> {
    let host = config.discovery.host.as_str();
    match mode {
        DiscoveryMode::All => {
            println!("{} Discovering MCP servers on {}...", "🔍".cyan(), host);
            Ok(discovery.discover_all(host).await)
        }
        DiscoveryMode::TcpOnly => {
            println!(
                "{} Scanning TCP ports {}-{} on {}...",
                "🔍".cyan(),
                config.discovery.start_port,
                config.discovery.end_port,
                host
            );
            Ok(discovery
                .scan_port_range(host, config.discovery.start_port, config.discovery.end_port)
                .await)
        }
        DiscoveryMode::DockerOnly => {
            println!("{} Discovering Docker MCP servers...", "🐳".cyan());
            let mut servers = discovery.discover_containers().await?;
            servers.push(socat_descriptor(discovery)?);
            Ok(servers)
        }
    }
}

/// The `alpine/socat` bridge entry added by `--docker-only`.
fn socat_descriptor(discovery: &Discovery) -> Result<ServerDescriptor> {
    Ok(ServerDescriptor {
        name: "Docker MCP (alpine/socat)".to_string(),
        kind: ServerKind::Docker,
        address: DOCKER_HOST_GATEWAY.to_string(),
        port: BRIDGE_PORT,
        transport: docker_socat_spec(BRIDGE_PORT).build(discovery.timeout())?,
        description: format!(
            "Docker MCP server reached through alpine/socat at {}:{}",
            DOCKER_HOST_GATEWAY, BRIDGE_PORT
        ),
    })
}

fn print_servers(servers: &[ServerDescriptor], reachable: &[Option<bool>]) {
    let mut table = Table::new();
    table.add_row(row!["#", "Name", "Type", "Address", "Transport", "Status"]);

    for (i, (server, status)) in servers.iter().zip(reachable).enumerate() {
        let status = match status {
            Some(true) => "reachable".green().to_string(),
            Some(false) => "unreachable".red().to_string(),
            None => "-".to_string(),
        };
        table.add_row(row![
            i + 1,
            server.name,
            server.kind,
            server.location(),
            server.transport.endpoint(),
            status
        ]);
    }

    println!();
    table.printstd();
    println!();

    for (i, server) in servers.iter().enumerate() {
        println!("  {}. {}", i + 1, server.description);
    }
}
