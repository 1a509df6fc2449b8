//! Command parser for the interactive session
//!
//! Each input line is one command. Command words are case-insensitive and
//! most have a short alias. Anything after the command word is passed
//! through verbatim, so JSON arguments keep their spacing and case.

use thiserror::Error;

/// Errors that can occur when parsing a session command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Argument could not be interpreted
    #[error("Invalid argument for {command}: {arg}")]
    InvalidArgument { command: String, arg: String },
}

/// Target of a `connect` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSelector {
    /// One-based position in the last discovery listing.
    Index(usize),
    /// Case-insensitive name match.
    Name(String),
}

/// Commands understood by the interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Display help information
    Help,
    /// Run a full discovery and remember the results
    Discover,
    /// Connect to a discovered server
    Connect(ServerSelector),
    /// Disconnect from the current server
    Disconnect,
    /// Show connection status
    Status,
    /// List tools
    ListTools,
    /// Call a tool with optional raw JSON arguments
    CallTool {
        name: String,
        arguments: Option<String>,
    },
    /// List resources
    ListResources,
    /// Read a resource
    ReadResource(String),
    /// List prompts
    ListPrompts,
    /// Render a prompt with optional raw JSON arguments
    GetPrompt {
        name: String,
        arguments: Option<String>,
    },
    /// Ping the server
    Ping,
    /// Leave the session
    Exit,
    /// Blank line
    None,
}

/// Parse one input line
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands and missing or malformed
/// arguments.
///
/// # Examples
///
/// ```
/// use mcp_navigator::commands::shell::{parse_command, ShellCommand};
///
/// assert_eq!(parse_command("lt").unwrap(), ShellCommand::ListTools);
/// assert_eq!(
///     parse_command(r#"call search {"query": "rust"}"#).unwrap(),
///     ShellCommand::CallTool {
///         name: "search".to_string(),
///         arguments: Some(r#"{"query": "rust"}"#.to_string()),
///     }
/// );
/// ```
pub fn parse_command(input: &str) -> Result<ShellCommand, CommandError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(ShellCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };
    let word = word.to_lowercase();

    match word.as_str() {
        "help" | "h" | "?" => Ok(ShellCommand::Help),
        "discover" | "d" => Ok(ShellCommand::Discover),
        "connect" | "c" => {
            let arg = required(&word, rest, "connect <index|name>")?;
            Ok(ShellCommand::Connect(match arg.parse::<usize>() {
                Ok(0) => {
                    return Err(CommandError::InvalidArgument {
                        command: "connect".to_string(),
                        arg: arg.to_string(),
                    })
                }
                Ok(index) => ServerSelector::Index(index),
                Err(_) => ServerSelector::Name(arg.to_string()),
            }))
        }
        "disconnect" | "dc" => Ok(ShellCommand::Disconnect),
        "status" | "s" => Ok(ShellCommand::Status),
        "tools" | "list-tools" | "lt" => Ok(ShellCommand::ListTools),
        "call" | "call-tool" | "ct" => {
            let arg = required(&word, rest, "call <tool> [json]")?;
            let (name, arguments) = split_name(arg);
            Ok(ShellCommand::CallTool { name, arguments })
        }
        "resources" | "list-resources" | "lr" => Ok(ShellCommand::ListResources),
        "read" | "read-resource" | "rr" => {
            let uri = required(&word, rest, "read <uri>")?;
            Ok(ShellCommand::ReadResource(uri.to_string()))
        }
        "prompts" | "list-prompts" | "lp" => Ok(ShellCommand::ListPrompts),
        "prompt" | "get-prompt" | "gp" => {
            let arg = required(&word, rest, "prompt <name> [json]")?;
            let (name, arguments) = split_name(arg);
            Ok(ShellCommand::GetPrompt { name, arguments })
        }
        "ping" => Ok(ShellCommand::Ping),
        "exit" | "quit" | "q" => Ok(ShellCommand::Exit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

fn required<'a>(command: &str, rest: &'a str, usage: &str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(rest)
    }
}

fn split_name(arg: &str) -> (String, Option<String>) {
    match arg.split_once(char::is_whitespace) {
        Some((name, json)) if !json.trim().is_empty() => {
            (name.to_string(), Some(json.trim().to_string()))
        }
        Some((name, _)) => (name.to_string(), None),
        None => (arg.to_string(), None),
    }
}

/// Print help for the interactive session
pub fn print_help() {
    println!(
        r#"
Available Commands
==================

SERVERS:
  discover, d               - Discover available MCP servers
  connect, c <n|name>       - Connect to a discovered server
  disconnect, dc            - Disconnect from the current server
  status, s                 - Show connection status
  ping                      - Check the server is responsive

TOOLS:
  tools, lt                 - List tools on the current server
  call, ct <tool> [json]    - Call a tool with optional JSON arguments

RESOURCES:
  resources, lr             - List resources on the current server
  read, rr <uri>            - Read a resource

PROMPTS:
  prompts, lp               - List prompts on the current server
  prompt, gp <name> [json]  - Render a prompt with optional JSON arguments

OTHER:
  help, h                   - Show this help message
  exit, quit, q             - Leave the session
"#
    );
}
