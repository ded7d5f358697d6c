//! VetChart Server - veterinary clinic records API
//!
//! This library provides the HTTP surface of the VetChart backend: animal
//! registration, visit records with SOAP notes, dictation transcription,
//! SOAP generation and translation, appointments and photo uploads.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::*;
pub use server::{IntegrationStatus, VetChartServer};
pub use storage::{FileStore, StoredFile};

use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: VetChartServer) -> Router {
    let config = server.config.clone();
    routes::create_routes(config.enable_debug_endpoints, server.file_store.root())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer(&config))
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
