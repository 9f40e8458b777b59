//! The central Model Context Protocol engine
//!
//! Method routing for `initialize`, `tools/list` and `tools/call`, shared by the
//! stdio and HTTP transports, plus the audit trail for every dispatched call.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use rust_mcp_sdk::schema::{CallToolResult, ContentBlock, TextContent};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::DispatchError;
use crate::mcp::rpc::{RpcRequest, RpcResponse};
use crate::registry::ToolArguments;
use crate::AppState;

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn server_info() -> Value {
    json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
    })
}

pub fn server_capabilities() -> Value {
    json!({ "tools": {} })
}

pub async fn dispatch(state: &AppState, request: RpcRequest) -> RpcResponse {
    let audit_params = redact_audit_params(request.params.as_ref());
    let outcome = handle_method(state, &request.method, request.params.as_ref()).await;

    info!(
        method = %request.method,
        params = %audit_params,
        outcome = if outcome.is_ok() { "success" } else { "failure" },
        "mcp action audited"
    );

    match outcome {
        Ok(result) => RpcResponse::result(request.id, result),
        Err(err) => RpcResponse::error(request.id, err.into_rpc_error()),
    }
}

pub async fn handle_method(
    state: &AppState,
    method: &str,
    params: Option<&Value>,
) -> Result<Value, DispatchError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": SUPPORTED_PROTOCOL_VERSION,
            "capabilities": server_capabilities(),
            "serverInfo": server_info(),
        })),
        "tools/list" => Ok(json!({ "tools": state.tools.as_ref() })),
        "tools/call" => handle_tools_call(state, params).await,
        _ => Err(DispatchError::MethodNotFound(method.to_string())),
    }
}

pub async fn handle_tools_call(
    state: &AppState,
    params: Option<&Value>,
) -> Result<Value, DispatchError> {
    let params = params.and_then(Value::as_object);

    let name = match params.and_then(|params| params.get("name")) {
        Some(name) if !is_falsy(name) => name,
        _ => return Err(DispatchError::MissingToolName),
    };
    let name = match name.as_str() {
        Some(name) => name.to_string(),
        None => name.to_string(),
    };

    let arguments = match params.and_then(|params| params.get("arguments")) {
        Some(Value::Object(arguments)) => arguments.clone(),
        Some(value) if !is_falsy(value) => return Err(DispatchError::InvalidArguments),
        _ => ToolArguments::new(),
    };

    // A panicking executor is reported like any other tool failure.
    let result = match AssertUnwindSafe(state.registry.execute(&name, arguments))
        .catch_unwind()
        .await
    {
        Ok(result) => result.map_err(|err| DispatchError::ToolExecution(err.to_string()))?,
        Err(_) => {
            error!(tool = %name, "tool executor panicked");
            return Err(DispatchError::ToolExecution("tool panicked".to_string()));
        }
    };

    let text = serde_json::to_string_pretty(&result)
        .map_err(|err| DispatchError::ToolExecution(err.to_string()))?;

    serde_json::to_value(CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: None,
        meta: None,
        structured_content: None,
    })
    .map_err(|err| DispatchError::ToolExecution(err.to_string()))
}

/// JSON truthiness as the wire clients understand it: `null`, `false`, `0`
/// and `""` all count as absent.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey" | "auth"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
        || normalized.contains("webhook")
}
