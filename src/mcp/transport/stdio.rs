//! Stdio transport for MCP child-process servers
//!
//! This module implements [`StdioTransport`], which spawns a child process
//! on `connect` and communicates with it over its stdin/stdout pipes using
//! newline-delimited JSON framing.
//!
//! # Protocol
//!
//! - Outbound messages are written to the child's stdin as a single JSON
//!   object followed by a newline (`\n`).
//! - Inbound messages are read from the child's stdout, one JSON object per
//!   line.
//! - The child's stderr is drained by a background task and logged via
//!   `tracing::debug!`. It is diagnostic output, never an error.
//!
//! # Lifecycle
//!
//! `close` tears the child down in a fixed order: stdin, stdout, stderr,
//! terminate the process if it is still running, then wait for it to exit.
//! Every step runs even when an earlier one fails; the failures are returned
//! together as [`NavigatorError::Close`]. The child is spawned with
//! `kill_on_drop`, so dropping the transport without closing it still
//! terminates the process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::PoisonError;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{NavigatorError, Result};
use crate::mcp::transport::framing::{
    line_reader, line_writer, read_message, write_message, LineReader, LineWriter, Shutdown,
};
use crate::mcp::transport::Transport;
use crate::mcp::types::Message;

/// Stdio-based MCP transport that drives a child process.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use mcp_navigator::mcp::transport::{StdioTransport, Transport};
///
/// # #[tokio::main]
/// # async fn main() -> mcp_navigator::error::Result<()> {
/// let transport = StdioTransport::new(
///     "npx",
///     vec!["-y".into(), "@modelcontextprotocol/server-filesystem".into(), "/tmp".into()],
/// );
/// transport.connect(Duration::from_secs(5)).await?;
/// transport.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
    stdin: Mutex<Option<LineWriter<ChildStdin>>>,
    stdout: Mutex<Option<LineReader<ChildStdout>>>,
    stderr_drain: std::sync::Mutex<Option<JoinHandle<()>>>,
    child: Mutex<Option<Child>>,
    connected: AtomicBool,
    shutdown: Shutdown,
}

impl StdioTransport {
    /// Describe a child process to spawn on `connect`.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
            working_dir: None,
            stdin: Mutex::new(None),
            stdout: Mutex::new(None),
            stderr_drain: std::sync::Mutex::new(None),
            child: Mutex::new(None),
            connected: AtomicBool::new(false),
            shutdown: Shutdown::default(),
        }
    }

    /// Extra environment variables for the child, on top of the inherited
    /// environment.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Working directory for the child.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Executable that will be spawned.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Arguments passed to the executable.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// OS process id of the running child, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.as_ref().and_then(|c| c.id())
    }

    fn spawn_stderr_drain(&self, stderr: ChildStderr) {
        let command = self.command.clone();
        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(
                    target: "mcp_navigator::mcp::transport::stdio",
                    command = %command,
                    "server stderr: {}",
                    line
                );
            }
        });
        let previous = self
            .stderr_drain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn take_stderr_drain(&self) -> Option<JoinHandle<()>> {
        self.stderr_drain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    /// Spawn the child with piped stdin, stdout and stderr.
    ///
    /// Spawning does not block, so `timeout` is not consulted.
    async fn connect(&self, _timeout: Duration) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| NavigatorError::connect(self.command.clone(), e))?;

        // All three handles are Some because every stream was piped above.
        let (stdin, stdout, stderr) = match (
            child.stdin.take(),
            child.stdout.take(),
            child.stderr.take(),
        ) {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => {
                return Err(NavigatorError::connect(
                    self.command.clone(),
                    "child stdio pipes unavailable after spawn",
                ))
            }
        };

        tracing::info!(
            target: "mcp_navigator::mcp::transport::stdio",
            command = %self.command,
            pid = ?child.id(),
            "spawned server process"
        );

        self.spawn_stderr_drain(stderr);
        *self.stdin.lock().await = Some(line_writer(stdin));
        *self.stdout.lock().await = Some(line_reader(stdout));
        *self.child.lock().await = Some(child);
        self.shutdown.reset();
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.shutdown.trigger();

        let mut errors = Vec::new();

        if let Some(mut stdin) = self.stdin.lock().await.take() {
            if let Err(e) = stdin.get_mut().shutdown().await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    errors.push(NavigatorError::Io(e));
                }
            }
        }

        self.stdout.lock().await.take();

        if let Some(drain) = self.take_stderr_drain() {
            drain.abort();
            if let Err(e) = drain.await {
                if !e.is_cancelled() {
                    errors.push(NavigatorError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        e.to_string(),
                    )));
                }
            }
        }

        if let Some(mut child) = self.child.lock().await.take() {
            match child.try_wait() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    if let Err(e) = child.start_kill() {
                        errors.push(NavigatorError::Io(e));
                    }
                }
                Err(e) => errors.push(NavigatorError::Io(e)),
            }
            match child.wait().await {
                Ok(status) => tracing::debug!(
                    target: "mcp_navigator::mcp::transport::stdio",
                    command = %self.command,
                    %status,
                    "server process exited"
                ),
                Err(e) => errors.push(NavigatorError::Io(e)),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NavigatorError::Close(errors))
        }
    }

    async fn send(&self, message: &Message) -> Result<()> {
        if !self.is_connected() {
            return Err(NavigatorError::TransportNotConnected);
        }
        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or(NavigatorError::TransportNotConnected)?;
        write_message(stdin, message).await
    }

    async fn receive(&self) -> Result<Message> {
        if !self.is_connected() {
            return Err(NavigatorError::TransportNotConnected);
        }
        let stop = self.shutdown.token();
        let mut guard = self.stdout.lock().await;
        let stdout = guard
            .as_mut()
            .ok_or(NavigatorError::TransportNotConnected)?;

        let next = tokio::select! {
            _ = stop.cancelled() => return Err(NavigatorError::ConnectionClosed),
            next = read_message(stdout) => next?,
        };
        match next {
            Some(message) => Ok(message),
            None => {
                tracing::warn!(
                    target: "mcp_navigator::mcp::transport::stdio",
                    command = %self.command,
                    "server closed its stdout"
                );
                self.connected.store(false, Ordering::SeqCst);
                Err(NavigatorError::ConnectionClosed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> String {
        if self.args.is_empty() {
            format!("stdio:{}", self.command)
        } else {
            format!("stdio:{} {}", self.command, self.args.join(" "))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_never_connected_is_ok() {
        let transport = StdioTransport::new("cat", vec![]);
        transport.close().await.unwrap();
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_failure_is_connect_error() {
        let transport = StdioTransport::new("/nonexistent/mcp-server-binary", vec![]);
        let err = transport
            .connect(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, NavigatorError::Connect { .. }));
        assert!(!transport.is_connected());
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_cat_echoes_messages_in_order() {
        let transport = StdioTransport::new("cat", vec![]);
        transport.connect(Duration::from_secs(1)).await.unwrap();
        assert!(transport.pid().await.is_some());

        for id in 1..=3 {
            transport
                .send(&Message::request(id, "ping", None))
                .await
                .unwrap();
        }
        for id in 1..=3 {
            let echoed = tokio::time::timeout(Duration::from_secs(5), transport.receive())
                .await
                .unwrap()
                .unwrap();
            assert!(echoed.answers(id));
        }

        transport.close().await.unwrap();
        assert!(!transport.is_connected());
        assert!(transport.pid().await.is_none());
    }

    #[tokio::test]
    async fn test_close_terminates_long_running_child() {
        let transport = StdioTransport::new("sleep", vec!["30".to_string()]);
        transport.connect(Duration::from_secs(1)).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), transport.close())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_eof_marks_transport_disconnected() {
        let transport = StdioTransport::new("true", vec![]);
        transport.connect(Duration::from_secs(1)).await.unwrap();
        let err = tokio::time::timeout(Duration::from_secs(5), transport.receive())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, NavigatorError::ConnectionClosed));
        assert!(!transport.is_connected());
        transport.close().await.unwrap();
    }

    #[test]
    fn test_endpoint_lists_arguments() {
        let transport =
            StdioTransport::new("docker", vec!["exec".to_string(), "-i".to_string()]);
        assert_eq!(transport.endpoint(), "stdio:docker exec -i");
    }
}
