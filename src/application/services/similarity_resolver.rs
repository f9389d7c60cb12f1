//! # Similarity Resolver
//!
//! Turns the upstream similar-id listing into a [`SimilarIdSet`].

use crate::domain::errors::ProductResult;
use crate::domain::value_objects::{ProductId, SimilarIdSet};
use crate::infrastructure::upstream::ProductUpstream;
use std::sync::Arc;

/// Resolves the similar products of a product.
#[derive(Debug, Clone)]
pub struct SimilarityResolver {
    upstream: Arc<dyn ProductUpstream>,
}

impl SimilarityResolver {
    /// Creates a new resolver.
    #[must_use]
    pub fn new(upstream: Arc<dyn ProductUpstream>) -> Self {
        Self { upstream }
    }

    /// Lists the products similar to `product_id`, deduplicated in
    /// first-seen order.
    ///
    /// # Errors
    ///
    /// Propagates the upstream error unchanged.
    pub async fn resolve(&self, product_id: &ProductId) -> ProductResult<SimilarIdSet> {
        let listing = self.upstream.list_similar_ids(product_id).await?;
        let listed = listing.len();
        let ids = SimilarIdSet::from_listing(listing);

        tracing::debug!(
            product_id = %product_id,
            listed,
            distinct = ids.len(),
            "resolved similar products"
        );

        Ok(ids)
    }
}
