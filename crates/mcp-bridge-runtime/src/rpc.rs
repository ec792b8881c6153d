//! JSON-RPC 2.0 envelope types (C4). These are pure data: encoding and
//! transport live in [`crate::frame`] and [`crate::transport`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(rename = "jsonrpc")]
    pub _jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// A request with no `id` is a notification and never gets a reply
    /// (§4.4).
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error reply from a runtime [`Error`]. Callers must not
    /// invoke this for errors where [`Error::faults_connection`] is true;
    /// those never reach here because they close the connection instead.
    pub fn from_error(id: Value, err: &Error) -> Self {
        let code = err.to_jsonrpc_code().unwrap_or(-32603);
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: err.to_string(),
                data: err.to_jsonrpc_data(),
            }),
        }
    }

    pub fn to_json_string(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(Error::Serialization)
    }
}

/// Parse a frame's JSON payload into a [`Request`]. A JSON syntax error
/// maps to `Error::Parse` (-32700); a well-formed-but-wrong-shape document
/// maps to `Error::InvalidRequest` (-32600), per §7.
pub fn parse_request(payload: &str) -> crate::Result<Request> {
    let value: Value = serde_json::from_str(payload).map_err(|e| Error::Parse(e.to_string()))?;

    if value.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(Error::InvalidRequest(
            "missing or unsupported \"jsonrpc\" version".to_string(),
        ));
    }
    if value.get("method").and_then(Value::as_str).is_none() {
        return Err(Error::InvalidRequest(
            "missing \"method\" field".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| Error::InvalidRequest(e.to_string()))
}
