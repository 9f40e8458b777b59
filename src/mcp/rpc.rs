//! JSON-RPC protocol representations
//!
//! Request extraction from raw payloads and the typed response envelope shared
//! by every transport.

use rust_mcp_sdk::schema::RpcError;
use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: String,
    pub params: Option<Value>,
    pub id: Value,
}

impl RpcRequest {
    /// Extracts `{method, params, id}` from a decoded message.
    ///
    /// A missing `id` becomes `null`. A method that is not a string is kept as
    /// its JSON text so it can be echoed back in a "method not found" error.
    pub fn from_value(payload: &Value) -> Self {
        let method = payload.get("method").unwrap_or(&Value::Null);
        let method = match method.as_str() {
            Some(name) => name.to_string(),
            None => method.to_string(),
        };

        Self {
            method,
            params: payload.get("params").cloned(),
            id: payload.get("id").cloned().unwrap_or(Value::Null),
        }
    }
}

pub fn is_notification(payload: &Value) -> bool {
    payload.is_object() && payload.get("id").is_none()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcPayload {
    Result(Value),
    Error(RpcError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub payload: RpcPayload,
}

impl RpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: RpcPayload::Result(result),
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: RpcPayload::Error(error),
        }
    }

    pub fn error_code(&self) -> Option<i64> {
        match &self.payload {
            RpcPayload::Result(_) => None,
            RpcPayload::Error(error) => Some(error.code),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_code().is_some()
    }
}
