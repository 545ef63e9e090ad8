//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The upload route and health check
//! - Bearer-token authentication middleware
//! - The response envelope for upload outcomes

pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::AUTHORIZATION;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use imgrelay_core::upload::UploadService;
use imgrelay_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Upload pipeline.
    pub uploads: Arc<UploadService>,
}

/// Creates the main application router.
///
/// `max_body_bytes` bounds request bodies; inline base64 images need more
/// than axum's default.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
