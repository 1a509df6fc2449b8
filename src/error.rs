//! Error types for MCP Navigator
//!
//! This module defines the error taxonomy shared by the transports, the
//! protocol client and the discovery engine, using `thiserror` for the
//! variants. Every variant belongs to exactly one [`ErrorCategory`] so that
//! callers can tell local precondition failures, transport failures, server
//! reported protocol errors and decoding failures apart without matching on
//! message text.

use std::time::Duration;

use thiserror::Error;

/// Boxed cause carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Broad classification of a [`NavigatorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Local precondition violated; no I/O was performed.
    Precondition,
    /// Connect, send, receive, close or timeout failure.
    Transport,
    /// The server answered with a JSON-RPC error object.
    Protocol,
    /// A payload could not be decoded into the expected type.
    Decode,
    /// Configuration, I/O and other local failures.
    Local,
}

/// Main error type for MCP Navigator operations
#[derive(Error, Debug)]
pub enum NavigatorError {
    /// The client has not been connected
    #[error("client not connected")]
    NotConnected,

    /// The client is connected but the handshake has not completed
    #[error("client not initialized")]
    NotInitialized,

    /// A transport operation was attempted before `connect`
    #[error("transport not connected")]
    TransportNotConnected,

    /// Establishing the underlying connection, process or handshake failed
    #[error("failed to connect to {target}: {source}")]
    Connect {
        /// Address, URL or command being connected to
        target: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// Writing a message to the transport failed
    #[error("failed to send message: {0}")]
    Send(#[source] BoxError),

    /// Reading a message from the transport failed
    #[error("failed to receive message: {0}")]
    Receive(#[source] BoxError),

    /// The peer closed the connection
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// An operation did not complete within its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// What was being waited for
        operation: String,
        /// The deadline that elapsed
        after: Duration,
    },

    /// One or more steps of a close sequence failed
    #[error("close failed: {}", join_errors(.0))]
    Close(Vec<NavigatorError>),

    /// Server-reported JSON-RPC error
    #[error("server error {code}: {message}")]
    Protocol {
        /// JSON-RPC error code
        code: i64,
        /// Human readable message
        message: String,
        /// Optional opaque payload
        data: Option<serde_json::Value>,
    },

    /// A payload did not match the expected shape
    #[error("failed to decode {context}: {source}")]
    Decode {
        /// What was being decoded
        context: String,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with neither a result nor an error
    #[error("invalid response for {method}: {reason}")]
    InvalidResponse {
        /// Method of the originating request
        method: String,
        /// What was wrong with it
        reason: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl NavigatorError {
    /// Returns the taxonomy bucket this error belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_navigator::error::{ErrorCategory, NavigatorError};
    ///
    /// assert_eq!(NavigatorError::NotInitialized.category(), ErrorCategory::Precondition);
    /// ```
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotConnected | Self::NotInitialized | Self::TransportNotConnected => {
                ErrorCategory::Precondition
            }
            Self::Connect { .. }
            | Self::Send(_)
            | Self::Receive(_)
            | Self::ConnectionClosed
            | Self::Timeout { .. }
            | Self::Close(_) => ErrorCategory::Transport,
            Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::Decode { .. } | Self::InvalidResponse { .. } => ErrorCategory::Decode,
            Self::Config(_) | Self::Io(_) | Self::Serialization(_) | Self::Yaml(_) => {
                ErrorCategory::Local
            }
        }
    }

    /// True for deadline expiry, which never forces a disconnect.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Builds a [`NavigatorError::Timeout`].
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Builds a [`NavigatorError::Connect`] from any error type.
    pub fn connect<E>(target: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Connect {
            target: target.into(),
            source: source.into(),
        }
    }
}

fn join_errors(errors: &[NavigatorError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for MCP Navigator operations
pub type Result<T> = std::result::Result<T, NavigatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_display() {
        assert_eq!(NavigatorError::NotConnected.to_string(), "client not connected");
        assert_eq!(
            NavigatorError::NotInitialized.to_string(),
            "client not initialized"
        );
        assert_eq!(
            NavigatorError::TransportNotConnected.to_string(),
            "transport not connected"
        );
    }

    #[test]
    fn test_connect_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = NavigatorError::connect("localhost:8811", io);
        assert_eq!(
            error.to_string(),
            "failed to connect to localhost:8811: refused"
        );
        let source = std::error::Error::source(&error).expect("cause");
        assert_eq!(source.to_string(), "refused");
        assert_eq!(error.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_protocol_error_display() {
        let error = NavigatorError::Protocol {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        };
        assert_eq!(error.to_string(), "server error -32601: Method not found");
        assert_eq!(error.category(), ErrorCategory::Protocol);
    }

    #[test]
    fn test_close_error_joins_every_step() {
        let error = NavigatorError::Close(vec![
            NavigatorError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin")),
            NavigatorError::Io(std::io::Error::new(std::io::ErrorKind::Other, "wait")),
        ]);
        assert_eq!(error.to_string(), "close failed: IO error: stdin; IO error: wait");
    }

    #[test]
    fn test_timeout_is_transport_category_and_flagged() {
        let error = NavigatorError::timeout("tools/list", Duration::from_secs(1));
        assert!(error.is_timeout());
        assert_eq!(error.category(), ErrorCategory::Transport);
        assert_eq!(error.to_string(), "tools/list timed out after 1s");
    }

    #[test]
    fn test_decode_error_category() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let error = NavigatorError::Decode {
            context: "tools/list result".to_string(),
            source,
        };
        assert_eq!(error.category(), ErrorCategory::Decode);
        assert!(!error.is_timeout());
    }
}
