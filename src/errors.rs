use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_mcp_sdk::schema::RpcError;
use serde::Serialize;
use thiserror::Error;

use crate::mcp::rpc::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Failures produced while turning one JSON-RPC message into a response.
///
/// These never escape a request handler: each transport encodes them into a
/// JSON-RPC error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid Request: expected a single JSON-RPC request object")]
    InvalidRequest,
    #[error("Invalid params: tool name is required")]
    MissingToolName,
    #[error("Invalid params: arguments must be an object")]
    InvalidArguments,
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),
}

impl DispatchError {
    pub fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => PARSE_ERROR,
            Self::InvalidRequest => INVALID_REQUEST,
            Self::MissingToolName | Self::InvalidArguments => INVALID_PARAMS,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::ToolExecution(_) => INTERNAL_ERROR,
        }
    }

    pub fn into_rpc_error(self) -> RpcError {
        RpcError {
            code: self.code(),
            data: None,
            message: self.to_string(),
        }
    }
}

/// HTTP-level failures that are answered with a plain `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("startMCPServer returned unexpected value")]
    UnexpectedResultShape,
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    StartFailed(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn start_failed(message: impl Into<String>) -> Self {
        Self::StartFailed(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnexpectedResultShape | Self::Configuration(_) | Self::StartFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        match self {
            Self::MethodNotAllowed => (
                status,
                [
                    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                    (header::ALLOW, ALLOWED_METHODS),
                ],
                body,
            )
                .into_response(),
            Self::Configuration(ref message) => {
                tracing::error!(error = %message, "no usable server entrypoint");
                (status, body).into_response()
            }
            Self::UnexpectedResultShape | Self::StartFailed(_) => {
                tracing::error!(error = %self, "server start failed");
                (status, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_errors_carry_reserved_codes() {
        assert_eq!(DispatchError::Parse("eof".into()).code(), -32700);
        assert_eq!(DispatchError::InvalidRequest.code(), -32600);
        assert_eq!(DispatchError::MissingToolName.code(), -32602);
        assert_eq!(DispatchError::InvalidArguments.code(), -32602);
        assert_eq!(DispatchError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(DispatchError::ToolExecution("boom".into()).code(), -32603);
    }

    #[test]
    fn tool_failure_becomes_internal_protocol_error() {
        let error = DispatchError::ToolExecution("Unknown tool: nope".into()).into_rpc_error();

        assert_eq!(error.code, -32603);
        assert_eq!(error.message, "Tool execution failed: Unknown tool: nope");
        assert!(error.data.is_none());
    }

    #[test]
    fn method_not_allowed_sets_allow_header() {
        let response = AppError::MethodNotAllowed.into_response();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], ALLOWED_METHODS);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn configuration_error_is_server_error() {
        let response = AppError::configuration("nothing exported").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
