//! # HTTP Product Upstream
//!
//! reqwest-based transport for the upstream product service.
//!
//! This adapter performs one HTTP call per operation and classifies the
//! outcome. It applies connect and read timeouts but no retry or circuit
//! breaking; wrap it in a
//! [`ResilientProductClient`](super::resilient::ResilientProductClient) for
//! that.
//!
//! Endpoints, relative to the base URL:
//! - `GET product/{id}/similarids` → JSON array of ids
//! - `GET product/{id}` → product details
//!
//! # Examples
//!
//! ```ignore
//! use similar_products::infrastructure::upstream::HttpProductUpstream;
//!
//! let upstream = HttpProductUpstream::new("http://localhost:3001", 1000, 3000)?;
//! let ids = upstream.list_similar_ids(&"1".into()).await?;
//! ```

use crate::domain::entities::ProductDetails;
use crate::domain::errors::{ProductError, ProductResult};
use crate::domain::value_objects::ProductId;
use crate::infrastructure::upstream::dto::{ProductDetailsDto, SimilarIdsDto};
use crate::infrastructure::upstream::traits::{ProductUpstream, UpstreamOperation};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;

/// Error building the HTTP transport.
#[derive(Debug, Error)]
pub enum UpstreamSetupError {
    /// Base URL does not parse or cannot carry path segments.
    #[error("invalid upstream base URL '{url}': {message}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// The underlying HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP transport for the upstream product service.
#[derive(Debug, Clone)]
pub struct HttpProductUpstream {
    /// Inner reqwest client.
    client: Client,
    /// Base address of the product service.
    base_url: Url,
    /// Connect timeout in milliseconds.
    connect_timeout_ms: u64,
    /// Read timeout in milliseconds.
    read_timeout_ms: u64,
}

impl HttpProductUpstream {
    /// Creates a new transport.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base address of the product service.
    /// * `connect_timeout_ms` - Connect timeout in milliseconds.
    /// * `read_timeout_ms` - Response read timeout in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamSetupError::InvalidBaseUrl` if the URL is unusable,
    /// or `UpstreamSetupError::Client` if the client cannot be created.
    pub fn new(
        base_url: &str,
        connect_timeout_ms: u64,
        read_timeout_ms: u64,
    ) -> Result<Self, UpstreamSetupError> {
        let parsed = Url::parse(base_url).map_err(|e| UpstreamSetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(UpstreamSetupError::InvalidBaseUrl {
                url: base_url.to_string(),
                message: "URL cannot be a base".to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(connect_timeout_ms))
            .read_timeout(Duration::from_millis(read_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            connect_timeout_ms,
            read_timeout_ms,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the connect timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn connect_timeout_ms(&self) -> u64 {
        self.connect_timeout_ms
    }

    /// Returns the read timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn read_timeout_ms(&self) -> u64 {
        self.read_timeout_ms
    }

    /// Builds `{base}/product/{id}[/{tail}]` with the id as one encoded segment.
    fn endpoint(&self, product_id: &ProductId, tail: Option<&str>) -> ProductResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ProductError::unknown(product_id, "base URL cannot be a base"))?;
            segments.pop_if_empty().push("product").push(product_id.as_str());
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }

    /// Sends a GET request and returns the body of a 2xx response.
    async fn get_body(
        &self,
        operation: UpstreamOperation,
        product_id: &ProductId,
        url: Url,
    ) -> ProductResult<Vec<u8>> {
        tracing::debug!(%operation, product_id = %product_id, %url, "calling upstream");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(product_id, e))?;

        self.handle_response(product_id, response).await
    }

    /// Checks the status and reads the body.
    async fn handle_response(
        &self,
        product_id: &ProductId,
        response: Response,
    ) -> ProductResult<Vec<u8>> {
        let status = response.status();

        if status.is_success() {
            response
                .bytes()
                .await
                .map(|body| body.to_vec())
                .map_err(|e| self.map_reqwest_error(product_id, e))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            Err(self.map_status_error(product_id, status, &error_body))
        }
    }

    /// Maps a reqwest error to a ProductError.
    fn map_reqwest_error(&self, product_id: &ProductId, error: reqwest::Error) -> ProductError {
        if error.is_timeout() {
            ProductError::timeout_with_duration(
                product_id,
                format!("Request timed out: {}", error),
                self.read_timeout_ms,
            )
        } else if error.is_connect() {
            ProductError::connection(product_id, format!("Connection failed: {}", error))
        } else if error.is_decode() {
            ProductError::unknown(product_id, format!("Failed to read response: {}", error))
        } else {
            ProductError::connection(product_id, format!("HTTP request failed: {}", error))
        }
    }

    /// Maps a non-success HTTP status to a ProductError.
    fn map_status_error(&self, product_id: &ProductId, status: StatusCode, body: &str) -> ProductError {
        match status {
            StatusCode::NOT_FOUND => ProductError::not_found(product_id),
            status if status.is_server_error() => ProductError::upstream_with_status(
                product_id,
                format!("Server error ({}): {}", status, body),
                status.as_u16(),
            ),
            _ => ProductError::unknown(product_id, format!("HTTP error ({}): {}", status, body)),
        }
    }
}

#[async_trait]
impl ProductUpstream for HttpProductUpstream {
    async fn list_similar_ids(&self, product_id: &ProductId) -> ProductResult<Vec<ProductId>> {
        let url = self.endpoint(product_id, Some("similarids"))?;
        let body = self
            .get_body(UpstreamOperation::ListSimilarIds, product_id, url)
            .await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice::<SimilarIdsDto>(&body)
            .map(SimilarIdsDto::into_domain)
            .map_err(|e| {
                ProductError::unknown(product_id, format!("Failed to parse similar ids: {}", e))
            })
    }

    async fn fetch_details(&self, product_id: &ProductId) -> ProductResult<ProductDetails> {
        let url = self.endpoint(product_id, None)?;
        let body = self
            .get_body(UpstreamOperation::FetchDetails, product_id, url)
            .await?;

        let details = serde_json::from_slice::<ProductDetailsDto>(&body)
            .map_err(|e| {
                ProductError::unknown(product_id, format!("Failed to parse product details: {}", e))
            })?
            .into_domain()?;

        if details.product_id() != product_id {
            return Err(ProductError::unknown(
                product_id,
                format!("Upstream returned details for product {}", details.product_id()),
            ));
        }

        Ok(details)
    }
}
