//! WebSocket transport
//!
//! Each MCP message travels as one text frame. After the handshake two
//! background tasks own the socket:
//!
//! - the read pump pushes inbound text frames into a bounded queue and
//!   reports failures on a separate error channel;
//! - the write pump drains a bounded outbound queue onto the socket.
//!
//! Both pumps watch one [`CancellationToken`]. `close` cancels it, the write
//! pump sends a close frame on its way out, and the socket is dropped once
//! both tasks have finished.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{NavigatorError, Result};
use crate::mcp::transport::Transport;
use crate::mcp::types::Message;

/// Capacity of the inbound and outbound frame queues.
pub const QUEUE_CAPACITY: usize = 100;

/// Capacity of the pump error channel.
pub const ERROR_CAPACITY: usize = 10;

/// Default handshake and per-operation timeout.
pub const DEFAULT_WS_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on how long `close` waits for the write pump to say goodbye.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Receiving ends owned by `receive`.
#[derive(Debug)]
struct Inbound {
    frames: mpsc::Receiver<String>,
    errors: mpsc::Receiver<NavigatorError>,
}

/// Handles needed to stop the pumps.
#[derive(Debug)]
struct Pumps {
    cancel: CancellationToken,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// WebSocket transport with background read and write pumps.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mcp_navigator::mcp::transport::{Transport, WebSocketTransport};
///
/// let transport = WebSocketTransport::new("ws://localhost:9000/mcp")
///     .unwrap()
///     .with_timeout(Duration::from_secs(10));
/// assert!(!transport.is_connected());
/// ```
#[derive(Debug)]
pub struct WebSocketTransport {
    url: Url,
    handshake_timeout: Duration,
    timeout: Duration,
    connected: Arc<AtomicBool>,
    outbound: std::sync::Mutex<Option<mpsc::Sender<String>>>,
    inbound: Mutex<Option<Inbound>>,
    pumps: std::sync::Mutex<Option<Pumps>>,
}

impl WebSocketTransport {
    /// Create an unconnected transport for a `ws://` or `wss://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError::Config`] if the URL does not parse or uses
    /// another scheme.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| NavigatorError::Config(format!("invalid WebSocket URL {}: {}", url, e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(NavigatorError::Config(format!(
                "WebSocket URL must use ws or wss, got {}",
                url.scheme()
            )));
        }
        Ok(Self {
            url,
            handshake_timeout: DEFAULT_WS_TIMEOUT,
            timeout: DEFAULT_WS_TIMEOUT,
            connected: Arc::new(AtomicBool::new(false)),
            outbound: std::sync::Mutex::new(None),
            inbound: Mutex::new(None),
            pumps: std::sync::Mutex::new(None),
        })
    }

    /// Bound for the opening handshake.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Bound for enqueueing a send and for waiting in `receive`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn outbound_sender(&self) -> Option<mpsc::Sender<String>> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop the pumps of the current session, if any, and wait for them.
    async fn stop_pumps(&self) {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let pumps = self
            .pumps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(pumps) = pumps else {
            return;
        };

        pumps.cancel.cancel();
        let mut writer = pumps.writer;
        if tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
            tracing::debug!(
                target: "mcp_navigator::mcp::transport::websocket",
                "write pump did not finish in time; aborting"
            );
            writer.abort();
        }
        let mut reader = pumps.reader;
        if tokio::time::timeout(CLOSE_GRACE, &mut reader).await.is_err() {
            reader.abort();
        }
    }
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, timeout: Duration) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        // Leftovers from a session whose pumps already failed.
        self.stop_pumps().await;

        let limit = timeout.min(self.handshake_timeout);
        let target = self.url.to_string();
        tracing::debug!(
            target: "mcp_navigator::mcp::transport::websocket",
            url = %target,
            timeout = ?limit,
            "opening handshake"
        );

        let (stream, _response) = match tokio::time::timeout(limit, connect_async(target.as_str()))
            .await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(NavigatorError::connect(target, e)),
            Err(_) => {
                return Err(NavigatorError::connect(
                    target,
                    NavigatorError::timeout("websocket handshake", limit),
                ))
            }
        };

        let (sink, source) = stream.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (frames_tx, frames_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (errors_tx, errors_rx) = mpsc::channel(ERROR_CAPACITY);
        let cancel = CancellationToken::new();

        let reader = tokio::spawn(read_pump(
            source,
            frames_tx,
            errors_tx.clone(),
            self.connected.clone(),
            cancel.clone(),
        ));
        let writer = tokio::spawn(write_pump(
            sink,
            outbound_rx,
            errors_tx,
            self.connected.clone(),
            cancel.clone(),
        ));

        *self.inbound.lock().await = Some(Inbound {
            frames: frames_rx,
            errors: errors_rx,
        });
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = Some(outbound_tx);
        *self.pumps.lock().unwrap_or_else(PoisonError::into_inner) = Some(Pumps {
            cancel,
            reader,
            writer,
        });
        self.connected.store(true, Ordering::SeqCst);

        tracing::info!(
            target: "mcp_navigator::mcp::transport::websocket",
            url = %target,
            "connected"
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.stop_pumps().await;
        self.inbound.lock().await.take();
        Ok(())
    }

    async fn send(&self, message: &Message) -> Result<()> {
        if !self.is_connected() {
            return Err(NavigatorError::TransportNotConnected);
        }
        let sender = self
            .outbound_sender()
            .ok_or(NavigatorError::TransportNotConnected)?;
        let text = serde_json::to_string(message)?;

        sender
            .send_timeout(text, self.timeout)
            .await
            .map_err(|e| match e {
                mpsc::error::SendTimeoutError::Timeout(_) => {
                    NavigatorError::timeout("websocket send", self.timeout)
                }
                mpsc::error::SendTimeoutError::Closed(_) => NavigatorError::ConnectionClosed,
            })
    }

    async fn receive(&self) -> Result<Message> {
        let cancel = self
            .pumps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.cancel.clone())
            .ok_or(NavigatorError::TransportNotConnected)?;

        let mut guard = self.inbound.lock().await;
        let inbound = guard
            .as_mut()
            .ok_or(NavigatorError::TransportNotConnected)?;

        let text = tokio::select! {
            biased;
            frame = inbound.frames.recv() => match frame {
                Some(text) => text,
                None => {
                    return Err(inbound
                        .errors
                        .try_recv()
                        .unwrap_or(NavigatorError::ConnectionClosed))
                }
            },
            Some(error) = inbound.errors.recv() => return Err(error),
            _ = cancel.cancelled() => return Err(NavigatorError::ConnectionClosed),
            _ = tokio::time::sleep(self.timeout) => {
                return Err(NavigatorError::timeout("websocket receive", self.timeout))
            }
        };

        serde_json::from_str(&text).map_err(|e| NavigatorError::Receive(Box::new(e)))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> String {
        self.url.to_string()
    }
}

async fn read_pump(
    mut source: SplitStream<WsStream>,
    frames: mpsc::Sender<String>,
    errors: mpsc::Sender<NavigatorError>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = source.next() => next,
        };

        let text = match next {
            Some(Ok(WsMessage::Text(text))) => text,
            Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    let _ = errors.try_send(NavigatorError::Receive(Box::new(e)));
                    continue;
                }
            },
            Some(Ok(WsMessage::Close(frame))) => {
                tracing::debug!(
                    target: "mcp_navigator::mcp::transport::websocket",
                    ?frame,
                    "peer sent close frame"
                );
                fail(&connected, &errors, NavigatorError::ConnectionClosed);
                return;
            }
            // Ping replies are queued by tungstenite itself.
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                fail(&connected, &errors, NavigatorError::Receive(Box::new(e)));
                return;
            }
            None => {
                fail(&connected, &errors, NavigatorError::ConnectionClosed);
                return;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => return,
            sent = frames.send(text) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

async fn write_pump(
    mut sink: SplitSink<WsStream, WsMessage>,
    mut outbound: mpsc::Receiver<String>,
    errors: mpsc::Sender<NavigatorError>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client closing".into(),
                };
                if let Err(e) = sink.send(WsMessage::Close(Some(frame))).await {
                    tracing::debug!(
                        target: "mcp_navigator::mcp::transport::websocket",
                        "close frame not delivered: {}",
                        e
                    );
                }
                let _ = sink.close().await;
                return;
            }
            next = outbound.recv() => match next {
                Some(text) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        fail(&connected, &errors, NavigatorError::Send(Box::new(e)));
                        return;
                    }
                }
                None => return,
            },
        }
    }
}

fn fail(connected: &AtomicBool, errors: &mpsc::Sender<NavigatorError>, error: NavigatorError) {
    tracing::warn!(
        target: "mcp_navigator::mcp::transport::websocket",
        "connection failed: {}",
        error
    );
    connected.store(false, Ordering::SeqCst);
    let _ = errors.try_send(error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_websocket_scheme() {
        let err = WebSocketTransport::new("http://localhost:9000").unwrap_err();
        assert!(matches!(err, NavigatorError::Config(_)));
        assert!(WebSocketTransport::new("not a url").is_err());
        assert!(WebSocketTransport::new("wss://example.com/mcp").is_ok());
    }

    #[tokio::test]
    async fn test_send_and_receive_before_connect_fail() {
        let transport = WebSocketTransport::new("ws://127.0.0.1:1").unwrap();
        let err = transport
            .send(&Message::request(1, "ping", None))
            .await
            .unwrap_err();
        assert!(matches!(err, NavigatorError::TransportNotConnected));
        let err = transport.receive().await.unwrap_err();
        assert!(matches!(err, NavigatorError::TransportNotConnected));
    }

    #[tokio::test]
    async fn test_close_never_connected_is_ok() {
        let transport = WebSocketTransport::new("ws://127.0.0.1:1").unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused_wraps_cause() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = WebSocketTransport::new(&format!("ws://127.0.0.1:{}", port)).unwrap();
        let err = transport
            .connect(Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, NavigatorError::Connect { .. }));
        assert!(!transport.is_connected());
        transport.close().await.unwrap();
    }
}
