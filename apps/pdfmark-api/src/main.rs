//! pdfmark API server

use anyhow::Result;
use clap::Parser;
use pdfmark_api::{router, AppState, Config};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // Initialize logging
    let log_level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(log_level.into())
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = config.bind_addr()?;
    info!("Initializing pdfmark API...");
    info!("Session limit: {}", config.max_sessions);
    info!("Upload limit: {} bytes", config.max_upload_bytes);

    let state = Arc::new(AppState::from_config(config));
    if state.rasterizer().is_err() {
        info!("Page rendering disabled (built without pdfium)");
    }
    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting pdfmark API on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
