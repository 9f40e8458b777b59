//! Edge deployment path
//!
//! A request on the edge route resolves the server-start function through
//! [`entrypoint::EntrypointResolver`], runs it, and shapes whatever it returned
//! into an HTTP response with [`negotiate::negotiate`].

use std::{io, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    response::Response,
};
use bytes::Bytes;
use futures_util::{
    stream::{BoxStream, Stream},
    FutureExt,
};
use serde_json::Value;

use crate::errors::AppError;
use crate::logging;

pub mod entrypoint;
pub mod negotiate;

use entrypoint::EntrypointResolver;

pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// What a server-start function hands back to the edge handler.
pub enum StartOutcome {
    /// A finished response, passed through untouched.
    Response(Response),
    /// Raw bytes to be served as Server-Sent Events.
    Stream(ByteStream),
    /// A JSON document; only objects are accepted.
    Json(Value),
}

impl StartOutcome {
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        Self::Stream(Box::pin(stream))
    }
}

#[async_trait]
pub trait ServerStart: Send + Sync {
    async fn start(&self, request: Request) -> Result<StartOutcome, AppError>;
}

pub async fn edge_endpoint(
    State(resolver): State<Arc<EntrypointResolver>>,
    request: Request,
) -> Response {
    let outcome = match resolver.resolve().await {
        Ok(start) => run_start(start.as_ref(), request).await,
        Err(err) => Err(err),
    };

    logging::log_start_outcome(&outcome);
    negotiate::negotiate(outcome)
}

async fn run_start(start: &dyn ServerStart, request: Request) -> Result<StartOutcome, AppError> {
    AssertUnwindSafe(start.start(request))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err(AppError::start_failed("server start panicked")))
}
