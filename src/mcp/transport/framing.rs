//! Newline-delimited JSON framing shared by the stream transports.
//!
//! `FramedRead` keeps partially read lines in its own buffer, so a
//! `receive` future that is dropped by a deadline loses nothing.

use std::sync::{Mutex, PoisonError};

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;

use crate::error::{NavigatorError, Result};
use crate::mcp::types::Message;

/// Upper bound for one inbound line.
pub(crate) const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

pub(crate) type LineReader<R> = FramedRead<R, LinesCodec>;
pub(crate) type LineWriter<W> = FramedWrite<W, LinesCodec>;

pub(crate) fn line_reader<R: AsyncRead>(inner: R) -> LineReader<R> {
    FramedRead::new(inner, LinesCodec::new_with_max_length(MAX_LINE_BYTES))
}

pub(crate) fn line_writer<W: AsyncWrite>(inner: W) -> LineWriter<W> {
    FramedWrite::new(inner, LinesCodec::new())
}

/// Serialize `message`, append the delimiter and flush.
pub(crate) async fn write_message<W>(writer: &mut LineWriter<W>, message: &Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = serde_json::to_string(message)?;
    writer
        .send(line)
        .await
        .map_err(|e| NavigatorError::Send(Box::new(e)))
}

/// Read the next non-blank line and decode it. `Ok(None)` means EOF.
pub(crate) async fn read_message<R>(reader: &mut LineReader<R>) -> Result<Option<Message>>
where
    R: AsyncRead + Unpin,
{
    loop {
        match reader.next().await {
            None => return Ok(None),
            Some(Err(e)) => return Err(NavigatorError::Receive(Box::new(e))),
            Some(Ok(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                return serde_json::from_str(line)
                    .map(Some)
                    .map_err(|e| NavigatorError::Receive(Box::new(e)));
            }
        }
    }
}

/// Per-connection stop signal that lets `close` interrupt a blocked read.
#[derive(Debug, Default)]
pub(crate) struct Shutdown(Mutex<CancellationToken>);

impl Shutdown {
    /// Token of the current connection.
    pub(crate) fn token(&self) -> CancellationToken {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Install a fresh token for a new connection.
    pub(crate) fn reset(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = CancellationToken::new();
    }

    /// Cancel the current connection's token.
    pub(crate) fn trigger(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_write_appends_single_newline() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut writer = line_writer(client);
        write_message(&mut writer, &Message::request(1, "ping", None))
            .await
            .unwrap();

        let mut buf = vec![0u8; 128];
        let n = tokio::io::AsyncReadExt::read(&mut server, &mut buf)
            .await
            .unwrap();
        let text = std::str::from_utf8(&buf[..n]).unwrap();
        assert_eq!(text, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");
    }

    #[tokio::test]
    async fn test_read_skips_blank_lines_and_reports_eof() {
        let (client, mut server) = tokio::io::duplex(1024);
        server
            .write_all(b"\n  \r\n{\"jsonrpc\":\"2.0\",\"method\":\"x\"}\r\n")
            .await
            .unwrap();
        drop(server);

        let mut reader = line_reader(client);
        let msg = read_message(&mut reader).await.unwrap().expect("message");
        assert_eq!(msg.method.as_deref(), Some("x"));
        assert!(read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_rejects_malformed_json() {
        let (client, mut server) = tokio::io::duplex(1024);
        server.write_all(b"not json\n").await.unwrap();
        let mut reader = line_reader(client);
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, NavigatorError::Receive(_)));
    }

    #[test]
    fn test_shutdown_reset_replaces_cancelled_token() {
        let shutdown = Shutdown::default();
        let first = shutdown.token();
        shutdown.trigger();
        assert!(first.is_cancelled());
        shutdown.reset();
        assert!(!shutdown.token().is_cancelled());
    }
}
