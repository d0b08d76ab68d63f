//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for expenses, revenues and return cancellation
//! - Authentication middleware
//! - Error to response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use settla_core::payment::DocumentLocks;
use settla_shared::JwtService;
use settla_shared::types::IdCodec;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Codec for identifiers in paths and bodies.
    pub codec: Arc<dyn IdCodec>,
    /// Per-document lock table shared by every repository.
    pub locks: DocumentLocks,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
