//! # StudyShelf Backend Library
//!
//! REST backend for a study-material sharing application. Teachers upload
//! files with metadata, all authenticated users list and filter them, and
//! teachers delete their own uploads.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server, routing and multipart handling
//! - **SQLx**: asynchronous SQLite persistence
//! - **Tokio**: async runtime
//! - **tower-http**: compression, CORS, static file serving, request tracing
//!
//! ## Core Components
//!
//! - [`config`]: layered application configuration
//! - [`db`]: database schema initialization
//! - [`error`]: centralized error handling and HTTP error responses
//! - [`middleware`]: authentication, rate limiting and security headers
//! - [`routes`]: HTTP API endpoint handlers
//! - [`storage`]: disk-backed upload adapter
//! - [`state`]: shared application state
//! - [`types`]: data transfer objects

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use error::AppError;
use state::AppState;

/// Assembles the full application router: routes, static upload serving and
/// the cross-cutting middleware stack (outermost first: security headers,
/// tracing, compression, rate limiting, CORS, body limit).
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // CORS: permissive during local development, locked to the configured
    // frontend origin otherwise.
    let cors = if state.config.is_development() {
        CorsLayer::permissive()
    } else {
        let origin = state.config.cors.frontend_origin.parse::<HeaderValue>().map_err(|e| {
            anyhow::anyhow!("invalid cors.frontend_origin {}: {}", state.config.cors.frontend_origin, e)
        })?;
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    let cfg_arc = state.config.clone();
    let uploads_dir = state.uploads.root().to_path_buf();

    let app = Router::new()
        .route("/", get(routes::health::welcome))
        .route("/health", get(routes::health::health))
        .route("/api/materials/upload", post(routes::materials::upload_material))
        .route("/api/materials", get(routes::materials::list_materials))
        .route(
            "/api/materials/subject/{subject}",
            get(routes::materials::list_materials_by_subject),
        )
        .route("/api/materials/{id}", delete(routes::materials::delete_material))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .fallback(|| async { AppError::NotFound("Route not found".to_string()) })
        .with_state(state.clone())
        // Global body limit (10 MB) for JSON and multipart payloads
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .layer(from_fn_with_state(state, middleware::rate_limit::rate_limit_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg_arc, middleware::security_headers::security_headers_middleware));

    Ok(app)
}
