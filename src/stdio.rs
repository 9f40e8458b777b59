//! Pipe transport for the MCP server.
//!
//! Reads newline-delimited JSON-RPC messages from stdin and writes one JSON
//! response per line to stdout. Stdout carries protocol messages only; logs go
//! to stderr.

use std::io;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::errors::DispatchError;
use crate::mcp::rpc::{is_notification, RpcRequest, RpcResponse};
use crate::mcp::server::dispatch;
use crate::AppState;

pub async fn serve(state: AppState) -> io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    info!(tools = state.tools.len(), "MCP server stdio transport ready");
    serve_connection(&state, stdin, stdout).await?;
    info!("stdin closed, MCP server shutting down");
    Ok(())
}

/// Serves one connection until the reader reaches EOF. Messages are handled
/// strictly in arrival order.
///
/// Lines are read as raw bytes so that a line which is not valid UTF-8 is
/// answered with a parse error instead of ending the session.
pub async fn serve_connection<R, W>(state: &AppState, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        let message = line.trim_ascii();
        if message.is_empty() {
            continue;
        }

        if let Some(response) = handle_message(state, message).await {
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
    }

    writer.flush().await
}

async fn handle_message(state: &AppState, message: &[u8]) -> Option<RpcResponse> {
    let payload: Value = match serde_json::from_slice(message) {
        Ok(payload) => payload,
        Err(err) => {
            return Some(RpcResponse::error(
                Value::Null,
                DispatchError::Parse(err.to_string()).into_rpc_error(),
            ))
        }
    };

    // Batches are not supported; every line must carry a single request object.
    if !payload.is_object() {
        return Some(RpcResponse::error(
            Value::Null,
            DispatchError::InvalidRequest.into_rpc_error(),
        ));
    }

    let request = RpcRequest::from_value(&payload);
    if is_notification(&payload) {
        debug!(method = %request.method, "notification received");
        return None;
    }

    // Liveness check from the host; answered by the transport, not the method table.
    if request.method == "ping" {
        return Some(RpcResponse::result(request.id, json!({})));
    }

    Some(dispatch(state, request).await)
}
