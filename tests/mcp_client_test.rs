//! MCP client integration tests over TCP
//!
//! Each test binds a `TcpListener` on an ephemeral port and runs a scripted
//! peer on it. The peer reads newline-delimited JSON requests and answers
//! through a per-test handler, so the tests exercise the real TCP transport,
//! framing and the client's request correlation end to end.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use mcp_navigator::error::{ErrorCategory, NavigatorError};
use mcp_navigator::mcp::types::{Implementation, PROTOCOL_VERSION};
use mcp_navigator::McpClient;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// What the scripted peer does with one inbound message.
enum Reply {
    /// Write these messages, in order.
    Send(Vec<Value>),
    /// Stay silent.
    Nothing,
    /// Close the connection.
    Hangup,
}

/// Start a single-connection peer. Every inbound message is recorded and
/// returned by the join handle once the connection ends.
async fn spawn_peer<F>(mut handler: F) -> (u16, JoinHandle<Vec<Value>>)
where
    F: FnMut(&Value) -> Reply + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let mut seen = Vec::new();

        while let Ok(Some(line)) = lines.next_line().await {
            let message: Value = serde_json::from_str(&line).unwrap();
            let reply = handler(&message);
            seen.push(message);
            match reply {
                Reply::Send(messages) => {
                    for m in messages {
                        let mut text = serde_json::to_string(&m).unwrap();
                        text.push('\n');
                        if write_half.write_all(text.as_bytes()).await.is_err() {
                            return seen;
                        }
                    }
                }
                Reply::Nothing => {}
                Reply::Hangup => return seen,
            }
        }
        seen
    });

    (port, handle)
}

/// Default answers for the handshake; `None` for everything else.
fn handshake(message: &Value) -> Option<Reply> {
    match message["method"].as_str() {
        Some("initialize") => Some(Reply::Send(vec![json!({
            "jsonrpc": "2.0",
            "id": message["id"],
            "result": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": true } },
                "serverInfo": { "name": "scripted-peer", "version": "2.3.4" }
            }
        })])),
        Some("notifications/initialized") => Some(Reply::Nothing),
        _ => None,
    }
}

async fn connected_client(port: u16) -> McpClient {
    let client = McpClient::builder()
        .tcp("127.0.0.1", port)
        .name("demo")
        .version("1.0.0")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    client.connect(None).await.unwrap();
    client
        .initialize(Implementation::new("demo", "1.0.0"), None)
        .await
        .unwrap();
    client
}

async fn within<T>(fut: impl std::future::Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("test step timed out")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_handshake_and_tool_call() {
    let (port, peer) = spawn_peer(|m| {
        if let Some(reply) = handshake(m) {
            return reply;
        }
        match m["method"].as_str() {
            Some("tools/call") => Reply::Send(vec![json!({
                "jsonrpc": "2.0",
                "id": m["id"],
                "result": {
                    "content": [ { "type": "text", "text": "found 3 results for golang" } ],
                    "isError": false
                }
            })]),
            _ => Reply::Hangup,
        }
    })
    .await;

    let client = within(connected_client(port)).await;
    assert!(client.is_initialized());
    assert_eq!(
        client.server_info(),
        Some(Implementation::new("scripted-peer", "2.3.4"))
    );
    assert!(client.server_capabilities().unwrap().tools.is_some());

    let mut args = serde_json::Map::new();
    args.insert("query".to_string(), json!("golang"));
    let result = within(client.call_tool("search", Some(args), None))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(
        result.content[0].as_text(),
        Some("found 3 results for golang")
    );

    within(client.disconnect()).await.unwrap();
    assert!(!client.is_connected());

    let seen = within(peer).await.unwrap();
    assert_eq!(seen.len(), 3);

    let init = &seen[0];
    assert_eq!(init["jsonrpc"], "2.0");
    assert_eq!(init["method"], "initialize");
    assert_eq!(init["params"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["params"]["clientInfo"]["name"], "demo");
    assert_eq!(init["params"]["clientInfo"]["version"], "1.0.0");
    assert!(init["params"]["capabilities"].is_object());

    let initialized = &seen[1];
    assert_eq!(initialized["method"], "notifications/initialized");
    assert!(initialized.get("id").is_none());

    let call = &seen[2];
    assert_eq!(call["method"], "tools/call");
    assert_eq!(call["params"]["name"], "search");
    assert_eq!(call["params"]["arguments"]["query"], "golang");
    assert_ne!(call["id"], init["id"]);
}

#[tokio::test]
async fn test_timeout_keeps_connection() {
    let (port, _peer) = spawn_peer(|m| {
        if let Some(reply) = handshake(m) {
            return reply;
        }
        match m["method"].as_str() {
            Some("tools/list") => Reply::Nothing,
            Some("ping") => Reply::Send(vec![json!({
                "jsonrpc": "2.0",
                "id": m["id"],
                "result": {}
            })]),
            _ => Reply::Hangup,
        }
    })
    .await;

    let client = within(connected_client(port)).await;

    let err = within(client.list_tools(Some(Duration::from_millis(200))))
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(client.is_connected());
    assert!(client.is_initialized());

    within(client.ping(None)).await.unwrap();
}

#[tokio::test]
async fn test_response_ids_are_normalized() {
    let (port, _peer) = spawn_peer(|m| {
        if let Some(reply) = handshake(m) {
            return reply;
        }
        let id = m["id"].as_u64().unwrap();
        match m["method"].as_str() {
            Some("ping") => Reply::Send(vec![json!({
                "jsonrpc": "2.0",
                "id": id.to_string(),
                "result": {}
            })]),
            Some("tools/list") => Reply::Send(vec![json!({
                "jsonrpc": "2.0",
                "id": id as f64,
                "result": { "tools": [ { "name": "search", "inputSchema": {} } ] }
            })]),
            _ => Reply::Hangup,
        }
    })
    .await;

    let client = within(connected_client(port)).await;
    within(client.ping(None)).await.unwrap();
    let tools = within(client.list_tools(None)).await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "search");
}

#[tokio::test]
async fn test_unrelated_messages_are_skipped() {
    let (port, _peer) = spawn_peer(|m| {
        if let Some(reply) = handshake(m) {
            return reply;
        }
        let id = m["id"].as_u64().unwrap();
        Reply::Send(vec![
            json!({ "jsonrpc": "2.0", "method": "notifications/progress", "params": { "progress": 1 } }),
            json!({ "jsonrpc": "2.0", "id": id + 100, "result": {} }),
            json!({ "jsonrpc": "2.0", "id": id, "result": { "resources": [] } }),
        ])
    })
    .await;

    let client = within(connected_client(port)).await;
    let resources = within(client.list_resources(None)).await.unwrap();
    assert!(resources.is_empty());
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_protocol_error_keeps_connection() {
    let (port, _peer) = spawn_peer(|m| {
        if let Some(reply) = handshake(m) {
            return reply;
        }
        Reply::Send(vec![json!({
            "jsonrpc": "2.0",
            "id": m["id"],
            "error": { "code": -32601, "message": "Method not found", "data": { "method": m["method"] } }
        })])
    })
    .await;

    let client = within(connected_client(port)).await;
    let err = within(client.list_prompts(None)).await.unwrap_err();
    match &err {
        NavigatorError::Protocol { code, message, data } => {
            assert_eq!(*code, -32601);
            assert_eq!(message, "Method not found");
            assert_eq!(data.as_ref().unwrap()["method"], "prompts/list");
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Protocol);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_peer_hangup_disconnects_client() {
    let (port, _peer) = spawn_peer(|m| handshake(m).unwrap_or(Reply::Hangup)).await;

    let client = within(connected_client(port)).await;
    let err = within(client.list_tools(None)).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Transport);
    assert!(!client.is_connected());
    assert!(!client.is_initialized());
    assert!(client.server_info().is_none());

    let err = within(client.list_tools(None)).await.unwrap_err();
    assert!(matches!(err, NavigatorError::NotInitialized));
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = McpClient::builder().tcp("127.0.0.1", port).build().unwrap();
    let err = within(client.connect(Some(Duration::from_secs(1))))
        .await
        .unwrap_err();
    assert!(matches!(err, NavigatorError::Connect { .. }));
    assert!(!client.is_connected());

    let err = within(client.initialize(Implementation::new("demo", "1.0.0"), None))
        .await
        .unwrap_err();
    assert!(matches!(err, NavigatorError::NotConnected));
}
