use serde_json::Value;
use thiserror::Error;

/// Closed error-kind taxonomy (§7). Every failure surfaced anywhere in the
/// runtime maps to exactly one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Tool blocked by security settings")]
    SecurityBlocked {
        command: String,
        reason: String,
        violations: Vec<crate::sandbox::Violation>,
    },

    #[error("Environment busy: {0}")]
    EnvironmentBusy(String),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Buffer overflow")]
    BufferOverflow,

    #[error("Shutdown error: {0}")]
    Shutdown(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout error")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// JSON-RPC numeric code for this error, or `None` for the three
    /// wire-only kinds that never become a reply (§7: `FrameError`,
    /// `BufferOverflow`, `ShutdownError` fault the connection instead).
    pub fn to_jsonrpc_code(&self) -> Option<i64> {
        match self {
            Error::Parse(_) => Some(-32700),
            Error::InvalidRequest(_) => Some(-32600),
            Error::UnknownTool(_) => Some(-32601),
            Error::InvalidParams(_) => Some(-32602),
            Error::Internal(_) => Some(-32603),
            Error::SecurityBlocked { .. } => Some(-32603),
            Error::EnvironmentBusy(_) => Some(-32603),
            Error::Serialization(_) => Some(-32603),
            Error::Timeout => Some(-32603),
            Error::Io(_) => Some(-32603),
            Error::Frame(_) | Error::BufferOverflow | Error::Shutdown(_) => None,
        }
    }

    /// Structured `data` payload for JSON-RPC error replies (§7). Only
    /// `SecurityBlocked` carries one; everything else is `None`.
    pub fn to_jsonrpc_data(&self) -> Option<Value> {
        match self {
            Error::SecurityBlocked {
                command,
                reason,
                violations,
            } => {
                let mut data = serde_json::json!({
                    "type": "security_blocked",
                    "command": command,
                    "reason": reason,
                });
                if !violations.is_empty() {
                    data["violations"] = serde_json::to_value(violations).unwrap_or(Value::Null);
                }
                Some(data)
            }
            _ => None,
        }
    }

    /// Whether this error kind faults the connection rather than replying
    /// (§7 propagation policy: framing/buffer errors kill the connection,
    /// handler errors never do).
    pub fn faults_connection(&self) -> bool {
        matches!(
            self,
            Error::Frame(_) | Error::BufferOverflow | Error::Shutdown(_)
        )
    }
}
