use std::sync::Arc;

use axum::{middleware, routing::any, Router};

pub mod config;
pub mod edge;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod registry;
pub mod stdio;

use edge::entrypoint::EntrypointResolver;
use registry::{ToolDescriptor, ToolRegistry};

/// Read-only server handle shared by every transport.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn ToolRegistry>,
    pub tools: Arc<[ToolDescriptor]>,
}

impl AppState {
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        let tools = Arc::from(registry.list_tools());
        Self { registry, tools }
    }
}

pub fn build_app(state: AppState) -> Router {
    let edge = Router::new()
        .route("/api/mcp", any(edge::edge_endpoint))
        .with_state(Arc::new(EntrypointResolver::bundled(state.clone())));

    Router::new()
        .route("/", any(http::handlers::mcp_endpoint))
        .with_state(state)
        .merge(edge)
        .layer(middleware::from_fn(logging::request_logging_middleware))
}
