//! MCP test server binary for integration tests
//!
//! This binary implements a minimal MCP server that communicates over
//! stdin/stdout using newline-delimited JSON (the stdio transport protocol).
//! It is used exclusively by integration tests to exercise the stdio
//! transport and the protocol client without a real external MCP server.
//!
//! # Handled Methods
//!
//! - `initialize` -- protocol version `2024-11-05`, capabilities for tools,
//!   resources and prompts.
//! - `notifications/initialized` -- acknowledged silently (no response).
//! - `ping` -- empty result.
//! - `tools/list` -- `echo`, `fail` and `sleep`. A `notifications/message`
//!   notification is written before the response.
//! - `tools/call` -- `echo` returns `arguments.message`, `fail` returns a
//!   result flagged `isError`, `sleep` waits `arguments.ms` milliseconds
//!   before answering.
//! - `resources/list`, `resources/read` -- one text resource,
//!   `memo://greeting`.
//! - `prompts/list`, `prompts/get` -- one prompt, `greet`, with a required
//!   `name` argument.
//! - All other methods -- JSON-RPC `-32601 Method not found`.
//!
//! A line is written to stderr at startup so the transport's stderr drain
//! has something to consume.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use serde_json::{json, Value};

fn main() {
    eprintln!("mcp_test_server: ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => {
                if !emit(&mut out, &make_error(&Value::Null, -32700, "Parse error")) {
                    break;
                }
                continue;
            }
        };

        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let id = request.get("id").cloned().unwrap_or(Value::Null);

        if method.starts_with("notifications/") {
            continue;
        }

        if method == "tools/list" {
            let notice = json!({
                "jsonrpc": "2.0",
                "method": "notifications/message",
                "params": { "level": "info", "data": "listing tools" }
            });
            if !emit(&mut out, &notice) {
                break;
            }
        }

        let params = request.get("params").cloned().unwrap_or(Value::Null);
        let response = match method {
            "initialize" => handle_initialize(&id),
            "ping" => respond(&id, json!({})),
            "tools/list" => handle_tools_list(&id),
            "tools/call" => handle_tools_call(&id, &params),
            "resources/list" => handle_resources_list(&id),
            "resources/read" => handle_resources_read(&id, &params),
            "prompts/list" => handle_prompts_list(&id),
            "prompts/get" => handle_prompts_get(&id, &params),
            _ => make_error(&id, -32601, &format!("Method not found: {}", method)),
        };

        if !emit(&mut out, &response) {
            break;
        }
    }
}

/// Write one message as a line. Returns false once stdout is gone.
fn emit(out: &mut impl Write, message: &Value) -> bool {
    let serialized = match serde_json::to_string(message) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mcp_test_server: failed to serialize response: {}", e);
            return true;
        }
    };
    writeln!(out, "{}", serialized).is_ok() && out.flush().is_ok()
}

fn respond(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn handle_initialize(id: &Value) -> Value {
    respond(
        id,
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": "mcp-test-server",
                "version": "0.1.0"
            }
        }),
    )
}

fn handle_tools_list(id: &Value) -> Value {
    respond(
        id,
        json!({
            "tools": [
                {
                    "name": "echo",
                    "description": "Echoes input",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "message": { "type": "string" } },
                        "required": ["message"]
                    }
                },
                {
                    "name": "fail",
                    "description": "Always reports a tool error",
                    "inputSchema": { "type": "object" }
                },
                {
                    "name": "sleep",
                    "description": "Answers after a delay",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "ms": { "type": "integer" } }
                    }
                }
            ]
        }),
    )
}

fn handle_tools_call(id: &Value, params: &Value) -> Value {
    let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match tool_name {
        "echo" => {
            let message = arguments
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("");
            respond(
                id,
                json!({
                    "content": [ { "type": "text", "text": message } ],
                    "isError": false
                }),
            )
        }
        "fail" => respond(
            id,
            json!({
                "content": [ { "type": "text", "text": "tool failed on purpose" } ],
                "isError": true
            }),
        ),
        "sleep" => {
            let ms = arguments.get("ms").and_then(|m| m.as_u64()).unwrap_or(0);
            std::thread::sleep(Duration::from_millis(ms));
            respond(
                id,
                json!({ "content": [ { "type": "text", "text": format!("slept {}ms", ms) } ] }),
            )
        }
        other => make_error(id, -32602, &format!("Unknown tool: {}", other)),
    }
}

fn handle_resources_list(id: &Value) -> Value {
    respond(
        id,
        json!({
            "resources": [
                {
                    "uri": "memo://greeting",
                    "name": "Greeting",
                    "description": "A friendly greeting",
                    "mimeType": "text/plain"
                }
            ]
        }),
    )
}

fn handle_resources_read(id: &Value, params: &Value) -> Value {
    let uri = params.get("uri").and_then(|u| u.as_str()).unwrap_or("");
    if uri != "memo://greeting" {
        return make_error(id, -32003, &format!("Resource not found: {}", uri));
    }
    respond(
        id,
        json!({
            "contents": [
                { "uri": uri, "mimeType": "text/plain", "text": "hello from the test server" }
            ]
        }),
    )
}

fn handle_prompts_list(id: &Value) -> Value {
    respond(
        id,
        json!({
            "prompts": [
                {
                    "name": "greet",
                    "description": "Greets someone by name",
                    "arguments": [
                        { "name": "name", "description": "Who to greet", "required": true }
                    ]
                }
            ]
        }),
    )
}

fn handle_prompts_get(id: &Value, params: &Value) -> Value {
    let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
    if name != "greet" {
        return make_error(id, -32602, &format!("Unknown prompt: {}", name));
    }
    let who = params
        .get("arguments")
        .and_then(|a| a.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("stranger");
    respond(
        id,
        json!({
            "description": "Greeting prompt",
            "messages": [
                {
                    "role": "user",
                    "content": { "type": "text", "text": format!("Please greet {}.", who) }
                }
            ]
        }),
    )
}

fn make_error(id: &Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}
