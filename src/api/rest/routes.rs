//! # REST Routes
//!
//! Router assembly.

use super::handlers::{self, AppState};
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Builds the service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/product/{product_id}/similar",
            get(handlers::get_similar_products),
        )
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
