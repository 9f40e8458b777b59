//! Axum HTTP handlers for the stateless transport
//!
//! Every request is answered within a single turnaround: `OPTIONS` preflight,
//! `GET` server description, `POST` JSON-RPC, and 405 for everything else.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::edge::{ServerStart, StartOutcome};
use crate::errors::{AppError, DispatchError, ALLOWED_METHODS};
use crate::mcp::rpc::{RpcRequest, RpcResponse, INTERNAL_ERROR};
use crate::mcp::server::{dispatch, server_capabilities, SERVER_NAME, SERVER_VERSION};
use crate::registry::ToolDescriptor;
use crate::AppState;

pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct ServerDescription<'a> {
    pub name: &'static str,
    pub version: &'static str,
    pub capabilities: Value,
    pub tools: &'a [ToolDescriptor],
}

pub async fn mcp_endpoint(State(state): State<AppState>, request: Request) -> Response {
    handle_request(&state, request).await
}

pub async fn handle_request(state: &AppState, request: Request) -> Response {
    let method = request.method().clone();

    match method {
        Method::OPTIONS => preflight(),
        Method::GET => describe_server(state),
        Method::POST => handle_rpc(state, request.into_body()).await,
        _ => AppError::MethodNotAllowed.into_response(),
    }
}

fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        ],
    )
        .into_response()
}

fn describe_server(state: &AppState) -> Response {
    json_response(
        StatusCode::OK,
        ServerDescription {
            name: SERVER_NAME,
            version: SERVER_VERSION,
            capabilities: server_capabilities(),
            tools: &state.tools,
        },
    )
}

async fn handle_rpc(state: &AppState, body: Body) -> Response {
    let payload = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes).map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    };

    let payload = match payload {
        Ok(payload) => payload,
        Err(message) => {
            return rpc_response(RpcResponse::error(
                Value::Null,
                DispatchError::Parse(message).into_rpc_error(),
            ))
        }
    };

    rpc_response(dispatch(state, RpcRequest::from_value(&payload)).await)
}

pub fn rpc_status(response: &RpcResponse) -> StatusCode {
    match response.error_code() {
        None => StatusCode::OK,
        Some(INTERNAL_ERROR) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(_) => StatusCode::BAD_REQUEST,
    }
}

fn rpc_response(response: RpcResponse) -> Response {
    json_response(rpc_status(&response), response)
}

fn json_response(status: StatusCode, body: impl Serialize) -> Response {
    (
        status,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(body),
    )
        .into_response()
}

#[async_trait]
impl ServerStart for AppState {
    async fn start(&self, request: Request) -> Result<StartOutcome, AppError> {
        Ok(StartOutcome::Response(handle_request(self, request).await))
    }
}
