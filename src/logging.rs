use std::{io, time::Instant};

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::edge::StartOutcome;
use crate::errors::AppError;

/// Logs always go to stderr: on the stdio transport stdout belongs to the
/// protocol.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();

    info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = elapsed_ms,
        "request summary"
    );

    if status.is_server_error() {
        warn!(method = %method, path = %path, status = status.as_u16(), "request failed");
    }

    response
}

pub fn start_outcome_kind(outcome: &Result<StartOutcome, AppError>) -> &'static str {
    match outcome {
        Ok(StartOutcome::Response(_)) => "response",
        Ok(StartOutcome::Stream(_)) => "stream",
        Ok(StartOutcome::Json(_)) => "json",
        Err(AppError::Configuration(_)) => "unresolved",
        Err(_) => "failed",
    }
}

/// Records what the edge server-start function handed back before it is
/// negotiated into a response.
pub fn log_start_outcome(outcome: &Result<StartOutcome, AppError>) {
    let kind = start_outcome_kind(outcome);
    match outcome {
        Ok(_) => debug!(outcome = kind, "edge server start completed"),
        Err(err) => warn!(outcome = kind, error = %err, "edge server start did not produce a response"),
    }
}
