//! pdfmark API
//!
//! REST endpoints over [`pdfmark_core`]:
//! - Annotation sessions (load, ink, text notes, page/tool selection, flush)
//! - Page search, text extraction and rendering
//! - Stateless create, merge, watermark, highlight and signature placement

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Session endpoints
        .route("/api/session", post(handlers::create_session))
        .route(
            "/api/session/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/session/:id/document", put(handlers::load_document))
        .route("/api/session/:id/ink", post(handlers::add_ink))
        .route("/api/session/:id/text", post(handlers::add_text))
        .route("/api/session/:id/page", post(handlers::select_page))
        .route("/api/session/:id/tool", post(handlers::select_tool))
        .route("/api/session/:id/commands", post(handlers::run_commands))
        .route("/api/session/:id/flush", get(handlers::flush))
        .route("/api/session/:id/pages/:page/search", get(handlers::search))
        .route("/api/session/:id/pages/:page/text", get(handlers::page_text))
        .route("/api/session/:id/pages/:page/render", get(handlers::render))
        // Stateless document operations
        .route("/api/create", post(handlers::create))
        .route("/api/merge", post(handlers::merge))
        .route("/api/watermark", post(handlers::watermark))
        .route("/api/highlight", post(handlers::highlight))
        .route("/api/signature", post(handlers::signature))
        // Add middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
