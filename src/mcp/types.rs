//! MCP 2024-11-05 wire model
//!
//! This module defines the JSON-RPC envelope and every protocol data
//! structure exchanged by the client: identities, capabilities, tools,
//! resources, prompts and content items. The types carry no behavior beyond
//! construction helpers and identifier normalization. Struct fields are
//! `camelCase` on the wire and optional fields are omitted when absent.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// Protocol revision sent in the `initialize` request.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Lifecycle: client sends `initialize` to open a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle: one-way notification completing the handshake.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
/// Keepalive ping.
pub const METHOD_PING: &str = "ping";
/// List available tools.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// Invoke a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";
/// List available resources.
pub const METHOD_RESOURCES_LIST: &str = "resources/list";
/// Read one resource by URI.
pub const METHOD_RESOURCES_READ: &str = "resources/read";
/// List available prompts.
pub const METHOD_PROMPTS_LIST: &str = "prompts/list";
/// Render one prompt by name.
pub const METHOD_PROMPTS_GET: &str = "prompts/get";

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;
/// Protocol specific: malformed MCP message.
pub const INVALID_MESSAGE: i64 = -32001;
/// Protocol specific: unknown or unusable tool.
pub const INVALID_TOOL: i64 = -32002;
/// Protocol specific: unknown or unreadable resource.
pub const INVALID_RESOURCE: i64 = -32003;

/// Free-form argument map used by tool calls and prompt rendering.
pub type Arguments = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 envelope.
///
/// Requests carry `id`, `method` and `params`. Notifications carry `method`
/// without `id`. Responses carry `id` and exactly one of `result` or
/// `error`.
///
/// # Examples
///
/// ```
/// use mcp_navigator::mcp::types::Message;
///
/// let request = Message::request(1, "tools/list", None);
/// assert!(request.is_request());
/// assert!(!Message::notification("notifications/initialized", None).is_request());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Correlation identifier. Absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name for requests and notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Successful response payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error response payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Message {
    /// Builds a request with an integer identifier.
    pub fn request(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::from(id)),
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Builds a one-way notification.
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Builds a successful response.
    pub fn response(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    pub fn error_response(id: Value, error: ErrorInfo) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: None,
            params: None,
            result: None,
            error: Some(error),
        }
    }

    /// True when the message has both an identifier and a method.
    pub fn is_request(&self) -> bool {
        self.id.is_some() && self.method.is_some()
    }

    /// True when the message has a method but no identifier.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.is_some()
    }

    /// True when the message has an identifier and no method.
    pub fn is_response(&self) -> bool {
        self.id.is_some() && self.method.is_none()
    }

    /// True when this message's identifier equals `expected` after numeric
    /// normalization. See [`request_id_matches`].
    pub fn answers(&self, expected: u64) -> bool {
        self.id
            .as_ref()
            .is_some_and(|id| request_id_matches(id, expected))
    }
}

/// Compares a wire identifier with the integer identifier that was sent.
///
/// Peers may echo the identifier back as an integer, a float or a numeric
/// string; all of them match when they denote the same integer.
///
/// # Examples
///
/// ```
/// use mcp_navigator::mcp::types::request_id_matches;
/// use serde_json::json;
///
/// assert!(request_id_matches(&json!(7), 7));
/// assert!(request_id_matches(&json!(7.0), 7));
/// assert!(request_id_matches(&json!("7"), 7));
/// assert!(!request_id_matches(&json!(7.5), 7));
/// ```
pub fn request_id_matches(id: &Value, expected: u64) -> bool {
    match id {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v == expected
            } else if let Some(f) = n.as_f64() {
                float_is(f, expected)
            } else {
                false
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<u64>() {
                v == expected
            } else if let Ok(f) = s.parse::<f64>() {
                float_is(f, expected)
            } else {
                false
            }
        }
        _ => false,
    }
}

fn float_is(value: f64, expected: u64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value == expected as f64
}

/// Error object carried by a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional opaque payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorInfo {
    /// Builds an error object without a payload.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// Name and version of a client or server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Implementation name.
    pub name: String,
    /// Implementation version.
    pub version: String,
}

impl Implementation {
    /// Creates an identity pair.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Empty marker block declaring sampling support.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingCapability {}

/// Capabilities advertised by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Non-standard capabilities.
    #[serde(default)]
    pub experimental: HashMap<String, Value>,
    /// Present when the client can service sampling requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapability>,
}

impl Default for ClientCapabilities {
    fn default() -> Self {
        Self {
            experimental: HashMap::new(),
            sampling: Some(SamplingCapability {}),
        }
    }
}

/// Empty marker block declaring logging support.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingCapability {}

/// Prompt support advertised by a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsCapability {
    /// The server emits list-changed notifications.
    #[serde(default)]
    pub list_changed: bool,
}

/// Resource support advertised by a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    /// The server accepts subscriptions.
    #[serde(default)]
    pub subscribe: bool,
    /// The server emits list-changed notifications.
    #[serde(default)]
    pub list_changed: bool,
}

/// Tool support advertised by a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// The server emits list-changed notifications.
    #[serde(default)]
    pub list_changed: bool,
}

/// Capabilities advertised by the server in the `initialize` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Non-standard capabilities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
    /// Logging support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingCapability>,
    /// Prompt support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
    /// Resource support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    /// Tool support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

impl ServerCapabilities {
    /// Names of the capability blocks the server declared, in wire order.
    pub fn declared(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.experimental.is_some() {
            names.push("experimental");
        }
        if self.logging.is_some() {
            names.push("logging");
        }
        if self.prompts.is_some() {
            names.push("prompts");
        }
        if self.resources.is_some() {
            names.push("resources");
        }
        if self.tools.is_some() {
            names.push("tools");
        }
        names
    }
}

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol revision requested by the client.
    pub protocol_version: String,
    /// Client capability block.
    pub capabilities: ClientCapabilities,
    /// Client identity.
    pub client_info: Implementation,
}

/// Result of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol revision chosen by the server.
    pub protocol_version: String,
    /// Server capability block.
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    /// Server identity.
    pub server_info: Implementation,
    /// Optional usage hints from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Tool metadata returned by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool arguments.
    #[serde(default)]
    pub input_schema: Value,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    /// Tools offered by the server.
    #[serde(default)]
    pub tools: Vec<Tool>,
    /// Pagination cursor, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Tool to invoke.
    pub name: String,
    /// Arguments, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content produced by the tool.
    #[serde(default)]
    pub content: Vec<Content>,
    /// True when the tool itself reported a failure.
    #[serde(default)]
    pub is_error: bool,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Resource metadata returned by `resources/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource URI.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Opaque annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Value>,
}

/// Result of `resources/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResult {
    /// Resources offered by the server.
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Pagination cursor, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `resources/read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceParams {
    /// URI to read.
    pub uri: String,
}

/// Result of `resources/read`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    /// Content items of the resource.
    #[serde(default)]
    pub contents: Vec<Content>,
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// One declared prompt argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// True when the argument must be supplied.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// Prompt metadata returned by `prompts/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PromptArgument>,
}

/// Result of `prompts/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPromptsResult {
    /// Prompts offered by the server.
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    /// Pagination cursor, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `prompts/get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptParams {
    /// Prompt to render.
    pub name: String,
    /// Template arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
}

/// Speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human side of the conversation.
    User,
    /// Model side of the conversation.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One rendered prompt message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Speaker.
    pub role: Role,
    /// Message body.
    pub content: Content,
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    /// Description of the rendered prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendered messages.
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// A content item inside tool results, resource reads and prompt messages.
///
/// `text` and `image` items get dedicated variants. Every other `type`
/// (including resource contents that carry no `type` at all) is kept in
/// [`Content::Other`] with all of its fields so it survives a round trip.
///
/// # Examples
///
/// ```
/// use mcp_navigator::mcp::types::Content;
///
/// let item: Content = serde_json::from_str(r#"{"type":"text","text":"hello"}"#).unwrap();
/// assert_eq!(item.as_text(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawContent", into = "RawContent")]
pub enum Content {
    /// Plain text.
    Text {
        /// The text.
        text: String,
        /// Opaque annotations.
        annotations: Option<Value>,
    },
    /// Base64 encoded image.
    Image {
        /// Base64 payload.
        data: String,
        /// Image MIME type.
        mime_type: String,
        /// Opaque annotations.
        annotations: Option<Value>,
    },
    /// Any other content type, preserved field by field.
    Other {
        /// The wire `type` tag; empty when the peer sent none.
        content_type: String,
        /// Text payload.
        text: Option<String>,
        /// Opaque data payload.
        data: Option<String>,
        /// MIME type.
        mime_type: Option<String>,
        /// Display name.
        name: Option<String>,
        /// Resource URI.
        uri: Option<String>,
        /// Base64 blob, as used by binary resource contents.
        blob: Option<String>,
        /// Opaque annotations.
        annotations: Option<Value>,
    },
}

impl Content {
    /// Creates a text item.
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text {
            text: text.into(),
            annotations: None,
        }
    }

    /// Creates an image item.
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Content::Image {
            data: data.into(),
            mime_type: mime_type.into(),
            annotations: None,
        }
    }

    /// The wire `type` tag of this item.
    pub fn content_type(&self) -> &str {
        match self {
            Content::Text { .. } => "text",
            Content::Image { .. } => "image",
            Content::Other { content_type, .. } => content_type,
        }
    }

    /// Returns the text payload for text items and for other items that
    /// carry one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text, .. } => Some(text),
            Content::Other { text, .. } => text.as_deref(),
            Content::Image { .. } => None,
        }
    }
}

/// Flat wire shape of a content item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotations: Option<Value>,
}

impl From<RawContent> for Content {
    fn from(raw: RawContent) -> Self {
        let only_text = raw.data.is_none()
            && raw.mime_type.is_none()
            && raw.name.is_none()
            && raw.uri.is_none()
            && raw.blob.is_none();
        let only_image =
            raw.text.is_none() && raw.name.is_none() && raw.uri.is_none() && raw.blob.is_none();

        match raw.content_type.as_str() {
            "text" if only_text && raw.text.is_some() => Content::Text {
                text: raw.text.unwrap_or_default(),
                annotations: raw.annotations,
            },
            "image" if only_image && raw.data.is_some() && raw.mime_type.is_some() => {
                Content::Image {
                    data: raw.data.unwrap_or_default(),
                    mime_type: raw.mime_type.unwrap_or_default(),
                    annotations: raw.annotations,
                }
            }
            _ => Content::Other {
                content_type: raw.content_type,
                text: raw.text,
                data: raw.data,
                mime_type: raw.mime_type,
                name: raw.name,
                uri: raw.uri,
                blob: raw.blob,
                annotations: raw.annotations,
            },
        }
    }
}

impl From<Content> for RawContent {
    fn from(content: Content) -> Self {
        match content {
            Content::Text { text, annotations } => RawContent {
                content_type: "text".to_string(),
                text: Some(text),
                annotations,
                ..Default::default()
            },
            Content::Image {
                data,
                mime_type,
                annotations,
            } => RawContent {
                content_type: "image".to_string(),
                data: Some(data),
                mime_type: Some(mime_type),
                annotations,
                ..Default::default()
            },
            Content::Other {
                content_type,
                text,
                data,
                mime_type,
                name,
                uri,
                blob,
                annotations,
            } => RawContent {
                content_type,
                text,
                data,
                mime_type,
                name,
                uri,
                blob,
                annotations,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_protocol_version_constant() {
        assert_eq!(PROTOCOL_VERSION, "2024-11-05");
    }

    #[test]
    fn test_request_serializes_without_result_or_error() {
        let msg = Message::request(3, METHOD_TOOLS_LIST, None);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}));
    }

    #[test]
    fn test_notification_has_no_id() {
        let msg = Message::notification(METHOD_INITIALIZED, None);
        let text = serde_json::to_string(&msg).unwrap();
        assert!(!text.contains("\"id\""));
        assert!(msg.is_notification());
        assert!(!msg.is_response());
    }

    #[test]
    fn test_null_id_decodes_as_absent() {
        let msg: Message =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(msg.id.is_none());
        assert!(msg.is_notification());
    }

    #[test]
    fn test_error_response_decodes() {
        let msg: Message = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"nope","data":{"m":"x"}}}"#,
        )
        .unwrap();
        let error = msg.error.expect("error");
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.data, Some(json!({"m": "x"})));
        assert_eq!(error.to_string(), "JSON-RPC error -32601: nope");
    }

    #[test]
    fn test_request_id_matches_numeric_encodings() {
        assert!(request_id_matches(&json!(42), 42));
        assert!(request_id_matches(&json!(42.0), 42));
        assert!(request_id_matches(&json!("42"), 42));
        assert!(request_id_matches(&json!("42.0"), 42));
        assert!(request_id_matches(&json!(" 42 "), 42));
    }

    #[test]
    fn test_request_id_rejects_other_values() {
        assert!(!request_id_matches(&json!(41), 42));
        assert!(!request_id_matches(&json!(42.5), 42));
        assert!(!request_id_matches(&json!("abc"), 42));
        assert!(!request_id_matches(&json!(-42), 42));
        assert!(!request_id_matches(&json!(null), 42));
        assert!(!request_id_matches(&json!([42]), 42));
    }

    #[test]
    fn test_message_answers_uses_normalization() {
        let msg = Message::response(json!("9"), json!({}));
        assert!(msg.answers(9));
        assert!(!msg.answers(10));
        assert!(!Message::notification("x", None).answers(9));
    }

    #[test]
    fn test_client_capabilities_default_declares_sampling() {
        let value = serde_json::to_value(ClientCapabilities::default()).unwrap();
        assert_eq!(value, json!({"experimental": {}, "sampling": {}}));
    }

    #[test]
    fn test_server_capabilities_partial_decode() {
        let caps: ServerCapabilities =
            serde_json::from_value(json!({"tools": {}, "resources": {"subscribe": true}}))
                .unwrap();
        assert_eq!(caps.tools, Some(ToolsCapability { list_changed: false }));
        assert!(caps.resources.as_ref().unwrap().subscribe);
        assert!(caps.prompts.is_none());
        assert_eq!(caps.declared(), vec!["resources", "tools"]);
    }

    #[test]
    fn test_tool_roundtrip() {
        let tool = Tool {
            name: "search".to_string(),
            description: Some("Search the index".to_string()),
            input_schema: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        };
        let wire = serde_json::to_string(&tool).unwrap();
        assert!(wire.contains("inputSchema"));
        let back: Tool = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, tool);
    }

    #[test]
    fn test_resource_roundtrip() {
        let resource = Resource {
            uri: "file:///etc/hosts".to_string(),
            name: "hosts".to_string(),
            description: None,
            mime_type: Some("text/plain".to_string()),
            annotations: Some(json!({"priority": 1})),
        };
        let back: Resource =
            serde_json::from_value(serde_json::to_value(&resource).unwrap()).unwrap();
        assert_eq!(back, resource);
    }

    #[test]
    fn test_prompt_roundtrip_with_arguments() {
        let prompt = Prompt {
            name: "review".to_string(),
            description: Some("Review code".to_string()),
            arguments: vec![
                PromptArgument {
                    name: "language".to_string(),
                    description: None,
                    required: true,
                },
                PromptArgument {
                    name: "style".to_string(),
                    description: Some("Tone".to_string()),
                    required: false,
                },
            ],
        };
        let value = serde_json::to_value(&prompt).unwrap();
        assert_eq!(value["arguments"][1].get("required"), None);
        let back: Prompt = serde_json::from_value(value).unwrap();
        assert_eq!(back, prompt);
    }

    #[test]
    fn test_content_text_and_image_roundtrip() {
        for item in [Content::text("hello"), Content::image("aGk=", "image/png")] {
            let back: Content =
                serde_json::from_value(serde_json::to_value(&item).unwrap()).unwrap();
            assert_eq!(back, item);
        }
    }

    #[test]
    fn test_content_other_preserves_data_and_mime_type() {
        let item = Content::Other {
            content_type: "audio".to_string(),
            text: None,
            data: Some("UklGRg==".to_string()),
            mime_type: Some("audio/wav".to_string()),
            name: None,
            uri: None,
            blob: None,
            annotations: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({"type": "audio", "data": "UklGRg==", "mimeType": "audio/wav"})
        );
        let back: Content = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_resource_contents_without_type_are_other() {
        let item: Content = serde_json::from_value(json!({
            "uri": "file:///a.txt",
            "mimeType": "text/plain",
            "text": "abc"
        }))
        .unwrap();
        assert_eq!(item.content_type(), "");
        assert_eq!(item.as_text(), Some("abc"));
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("type").is_none());
        assert_eq!(value["uri"], "file:///a.txt");
    }

    #[test]
    fn test_call_tool_result_decodes_text_item() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "hello"}],
            "isError": false
        }))
        .unwrap();
        assert_eq!(result.content, vec![Content::text("hello")]);
        assert!(!result.is_error);
    }

    #[test]
    fn test_call_tool_params_keep_arguments_verbatim() {
        let mut arguments = Arguments::new();
        arguments.insert("query".to_string(), json!("golang"));
        let params = CallToolParams {
            name: "search".to_string(),
            arguments: Some(arguments),
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"name": "search", "arguments": {"query": "golang"}})
        );
    }

    #[test]
    fn test_get_prompt_result_decodes_messages() {
        let result: GetPromptResult = serde_json::from_value(json!({
            "description": "greeting",
            "messages": [{"role": "assistant", "content": {"type": "text", "text": "hi"}}]
        }))
        .unwrap();
        assert_eq!(result.messages[0].role, Role::Assistant);
        assert_eq!(result.messages[0].content.as_text(), Some("hi"));
    }

    #[test]
    fn test_initialize_result_decodes_server_info() {
        let result: InitializeResult = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {"listChanged": true}},
            "serverInfo": {"name": "demo", "version": "1.0.0"}
        }))
        .unwrap();
        assert_eq!(result.server_info, Implementation::new("demo", "1.0.0"));
        assert!(result.capabilities.tools.unwrap().list_changed);
    }
}
