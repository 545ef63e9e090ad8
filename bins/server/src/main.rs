//! Image upload relay server
//!
//! Main entry point for the upload service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgrelay_api::{AppState, create_router};
use imgrelay_core::storage::StorageClient;
use imgrelay_core::upload::UploadService;
use imgrelay_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgrelay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    let jwt_service = JwtService::new(config.jwt.clone());

    // Storage connects on the first upload
    let storage = StorageClient::new(config.storage.clone());
    info!(provider = config.storage.name(), "Storage configured");

    let uploads = UploadService::from_config(&config.upload, storage)?;
    info!(
        default_bucket = %config.upload.default_bucket,
        timezone = %config.upload.default_timezone,
        "Upload service configured"
    );

    let state = AppState {
        jwt_service: Arc::new(jwt_service),
        uploads: Arc::new(uploads),
    };

    let app = create_router(state, config.server.max_body_bytes);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
