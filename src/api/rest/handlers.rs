//! # REST Handlers
//!
//! Request handlers, response bodies and shared state.

use crate::application::error::{OutwardSignal, translate};
use crate::application::use_cases::GetSimilarProductsUseCase;
use crate::domain::entities::ProductDetails;
use crate::domain::errors::ProductError;
use crate::domain::value_objects::ProductId;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The similar products use case.
    pub use_case: Arc<GetSimilarProductsUseCase>,
}

impl AppState {
    /// Creates handler state around a use case.
    #[must_use]
    pub fn new(use_case: GetSimilarProductsUseCase) -> Self {
        Self {
            use_case: Arc::new(use_case),
        }
    }
}

/// Details of one similar product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetailResponse {
    /// Product identifier.
    pub id: String,
    /// Product name.
    pub name: String,
    /// Product price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Whether the product is available.
    pub availability: bool,
}

impl From<ProductDetails> for ProductDetailResponse {
    fn from(details: ProductDetails) -> Self {
        Self {
            id: details.product_id().to_string(),
            name: details.name().to_string(),
            price: details.price(),
            availability: details.is_available(),
        }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Outward signal name.
    pub error: String,
    /// Generic description.
    pub message: String,
}

impl From<OutwardSignal> for ErrorResponse {
    fn from(signal: OutwardSignal) -> Self {
        Self {
            error: signal.as_str().to_string(),
            message: signal.message().to_string(),
        }
    }
}

/// Health check body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// A failed request, rendered through the error translator.
#[derive(Debug)]
pub struct ApiError {
    requested: ProductId,
    error: ProductError,
}

impl ApiError {
    /// Creates an error for a request about `requested`.
    #[must_use]
    pub fn new(requested: ProductId, error: ProductError) -> Self {
        Self { requested, error }
    }

    /// Returns the product the request was about.
    #[must_use]
    pub fn requested(&self) -> &ProductId {
        &self.requested
    }

    /// Returns the underlying error.
    #[must_use]
    pub fn error(&self) -> &ProductError {
        &self.error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let signal = translate(&self.requested, &self.error);
        let status =
            StatusCode::from_u16(signal.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(signal))).into_response()
    }
}

/// `GET /product/{product_id}/similar`
///
/// # Errors
///
/// Returns the translated error of the first failing lookup.
pub async fn get_similar_products(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<ProductDetailResponse>>, ApiError> {
    let product_id = ProductId::new(product_id);
    let details = state
        .use_case
        .execute(&product_id)
        .await
        .map_err(|error| ApiError::new(product_id.clone(), error))?;
    Ok(Json(details.into_iter().map(ProductDetailResponse::from).collect()))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
