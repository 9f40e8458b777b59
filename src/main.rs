use std::sync::Arc;

use bitrix24_mcp_server::{
    build_app,
    config::{Config, Transport},
    logging,
    registry::ToolCatalog,
    stdio, AppState,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    // Domain tools are registered by the embedding deployment.
    let catalog = ToolCatalog::new();
    if catalog.is_empty() {
        warn!("tool catalog is empty");
    }
    let state = AppState::new(Arc::new(catalog));

    match config.transport {
        Transport::Stdio => {
            info!("server starting on stdio");
            stdio::serve(state).await?;
        }
        Transport::Http => {
            let bind_socket = config.bind_socket()?;
            let app = build_app(state);
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                "server starting"
            );

            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
