//! # Get Similar Products Use Case
//!
//! Resolves the products similar to a product and fetches their details.
//!
//! ```text
//! caller → SimilarityResolver → SimilarIdSet → DetailAggregationEngine → details
//! ```
//!
//! The caller waits for the whole aggregation. Either every similar
//! product's details come back, in listing order, or a single classified
//! error does.

use crate::application::services::detail_aggregation::{AggregationConfig, DetailAggregationEngine};
use crate::application::services::similarity_resolver::SimilarityResolver;
use crate::domain::entities::ProductDetails;
use crate::domain::errors::ProductResult;
use crate::domain::value_objects::ProductId;
use crate::infrastructure::upstream::ProductUpstream;
use std::sync::Arc;

/// Use case for fetching similar products.
#[derive(Debug)]
pub struct GetSimilarProductsUseCase {
    resolver: SimilarityResolver,
    aggregator: DetailAggregationEngine,
}

impl GetSimilarProductsUseCase {
    /// Creates a new use case.
    #[must_use]
    pub fn new(resolver: SimilarityResolver, aggregator: DetailAggregationEngine) -> Self {
        Self {
            resolver,
            aggregator,
        }
    }

    /// Creates a use case whose stages share one upstream client.
    #[must_use]
    pub fn from_upstream(upstream: Arc<dyn ProductUpstream>, config: AggregationConfig) -> Self {
        Self::new(
            SimilarityResolver::new(Arc::clone(&upstream)),
            DetailAggregationEngine::new(upstream, config),
        )
    }

    /// Returns the details of every product similar to `product_id`.
    ///
    /// # Errors
    ///
    /// Returns the classified error of the listing call, or of the lowest
    /// indexed detail lookup that failed. No partial list is returned.
    pub async fn execute(&self, product_id: &ProductId) -> ProductResult<Vec<ProductDetails>> {
        let similar = self.resolver.resolve(product_id).await?;
        let details = self.aggregator.aggregate(&similar).await?;

        tracing::info!(
            product_id = %product_id,
            similar = details.len(),
            "similar products aggregated"
        );

        Ok(details)
    }
}
