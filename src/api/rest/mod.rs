//! # REST API
//!
//! Inbound HTTP endpoints using axum.
//!
//! # Endpoints
//!
//! - `GET /product/{product_id}/similar` - Details of the similar products
//! - `GET /health` - Health check
//!
//! # Usage
//!
//! ```ignore
//! use similar_products::api::rest::{AppState, create_router};
//!
//! let router = create_router(AppState::new(use_case));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState, ErrorResponse, HealthResponse, ProductDetailResponse};
pub use routes::create_router;
