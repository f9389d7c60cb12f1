//! # Product Upstream Trait
//!
//! Port definition for the upstream product service.
//!
//! The core depends only on this contract: list the identifiers similar to a
//! product, and fetch one product's details. Implementations classify every
//! failure into a [`ProductError`](crate::domain::errors::ProductError)
//! before returning it.
//!
//! # Examples
//!
//! ```ignore
//! use similar_products::infrastructure::upstream::ProductUpstream;
//!
//! struct MyUpstream { /* ... */ }
//!
//! #[async_trait::async_trait]
//! impl ProductUpstream for MyUpstream {
//!     // ... implement required methods
//! }
//! ```

use crate::domain::entities::ProductDetails;
use crate::domain::errors::ProductResult;
use crate::domain::value_objects::ProductId;
use async_trait::async_trait;
use std::fmt;

/// The two upstream operations, used to name policies and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamOperation {
    /// List similar product identifiers.
    ListSimilarIds,
    /// Fetch one product's details.
    FetchDetails,
}

impl UpstreamOperation {
    /// Returns the operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListSimilarIds => "list_similar_ids",
            Self::FetchDetails => "fetch_details",
        }
    }
}

impl fmt::Display for UpstreamOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream product service.
#[async_trait]
pub trait ProductUpstream: Send + Sync + fmt::Debug {
    /// Lists the identifiers similar to `product_id`, in upstream order.
    ///
    /// Duplicates are returned as-is. An empty upstream answer is an empty
    /// list, not an error.
    ///
    /// # Errors
    ///
    /// Returns a classified `ProductError` on failure.
    async fn list_similar_ids(&self, product_id: &ProductId) -> ProductResult<Vec<ProductId>>;

    /// Fetches the details of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the product does not exist, or
    /// another classified `ProductError` on failure.
    async fn fetch_details(&self, product_id: &ProductId) -> ProductResult<ProductDetails>;
}
