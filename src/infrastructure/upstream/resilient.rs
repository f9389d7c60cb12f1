//! # Resilient Product Client
//!
//! Decorator that applies per-operation resilience policy to any
//! [`ProductUpstream`].
//!
//! Each operation kind has its own [`OperationPolicy`]: a circuit breaker
//! shared by every caller in the process, a retry policy, and a per-attempt
//! deadline. Policies compose as
//!
//! ```text
//! retry( circuit_breaker( attempt_timeout( upstream call ) ) )
//! ```
//!
//! so every attempt is recorded by the breaker, and a call rejected by an
//! open breaker is never retried.
//!
//! # Examples
//!
//! ```ignore
//! use similar_products::infrastructure::upstream::{HttpProductUpstream, ResilientProductClient};
//!
//! let http = Arc::new(HttpProductUpstream::new("http://localhost:3001", 1000, 3000)?);
//! let client = ResilientProductClient::from_config(http, &config.resilience, attempt_timeout);
//! let details = client.fetch_details(&"2".into()).await?;
//! ```

use crate::application::services::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError,
};
use crate::application::services::retry::{RetryPolicy, execute_with_retry};
use crate::config::{OperationResilienceConfig, ResilienceConfig};
use crate::domain::entities::ProductDetails;
use crate::domain::errors::{ProductError, ProductResult};
use crate::domain::value_objects::ProductId;
use crate::infrastructure::upstream::traits::{ProductUpstream, UpstreamOperation};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Breaker name for the similar-ids operation.
pub const SIMILAR_IDS_BREAKER: &str = "similar-ids";

/// Breaker name for the product-details operation.
pub const PRODUCT_DETAILS_BREAKER: &str = "product-details";

/// Resilience policy for one operation kind.
#[derive(Debug, Clone)]
pub struct OperationPolicy {
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl OperationPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(breaker: Arc<CircuitBreaker>, retry: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            breaker,
            retry,
            attempt_timeout,
        }
    }

    /// Creates a policy with a fresh breaker named `name`.
    #[must_use]
    pub fn from_config(
        name: &str,
        config: &OperationResilienceConfig,
        attempt_timeout: Duration,
    ) -> Self {
        Self::new(
            Arc::new(CircuitBreaker::new(name, config.circuit_breaker.clone())),
            config.retry.clone(),
            attempt_timeout,
        )
    }

    /// Creates a policy with default breaker and retry settings.
    #[must_use]
    pub fn with_defaults(name: &str, attempt_timeout: Duration) -> Self {
        Self::new(
            Arc::new(CircuitBreaker::new(name, CircuitBreakerConfig::default())),
            RetryPolicy::default(),
            attempt_timeout,
        )
    }

    /// Returns the circuit breaker.
    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the per-attempt deadline.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }
}

/// [`ProductUpstream`] decorated with circuit breaking, retry, and timeouts.
#[derive(Debug)]
pub struct ResilientProductClient {
    upstream: Arc<dyn ProductUpstream>,
    similar_ids: OperationPolicy,
    details: OperationPolicy,
}

impl ResilientProductClient {
    /// Creates a client with explicit policies.
    #[must_use]
    pub fn new(
        upstream: Arc<dyn ProductUpstream>,
        similar_ids: OperationPolicy,
        details: OperationPolicy,
    ) -> Self {
        Self {
            upstream,
            similar_ids,
            details,
        }
    }

    /// Creates a client from configuration.
    #[must_use]
    pub fn from_config(
        upstream: Arc<dyn ProductUpstream>,
        config: &ResilienceConfig,
        attempt_timeout: Duration,
    ) -> Self {
        Self::new(
            upstream,
            OperationPolicy::from_config(SIMILAR_IDS_BREAKER, &config.similar_ids, attempt_timeout),
            OperationPolicy::from_config(
                PRODUCT_DETAILS_BREAKER,
                &config.product_details,
                attempt_timeout,
            ),
        )
    }

    /// Returns the policy applied to an operation kind.
    #[must_use]
    pub fn policy(&self, operation: UpstreamOperation) -> &OperationPolicy {
        match operation {
            UpstreamOperation::ListSimilarIds => &self.similar_ids,
            UpstreamOperation::FetchDetails => &self.details,
        }
    }

    async fn guarded<T, F, Fut>(
        &self,
        operation: UpstreamOperation,
        product_id: &ProductId,
        call: F,
    ) -> ProductResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ProductResult<T>>,
    {
        let policy = self.policy(operation);
        let call = &call;

        let result = execute_with_retry(policy.retry(), operation.as_str(), move || async move {
            let deadline = policy.attempt_timeout;
            let attempt = async move {
                tokio::time::timeout(deadline, call())
                    .await
                    .unwrap_or_else(|_| {
                        Err(ProductError::timeout_with_duration(
                            product_id,
                            "attempt deadline elapsed",
                            deadline.as_millis() as u64,
                        ))
                    })
            };
            policy
                .breaker
                .call(attempt, ProductError::counts_as_failure)
                .await
        })
        .await;

        result.map_err(|error| {
            let attempts = error.attempts();
            let error = match error.into_inner() {
                CircuitBreakerError::Open { name } => ProductError::upstream(
                    product_id,
                    format!("circuit breaker '{}' is open", name),
                ),
                CircuitBreakerError::Inner(error) => error,
            };
            tracing::debug!(
                %operation,
                product_id = %product_id,
                attempts,
                kind = %error.kind(),
                "upstream call failed"
            );
            error
        })
    }
}

#[async_trait]
impl ProductUpstream for ResilientProductClient {
    async fn list_similar_ids(&self, product_id: &ProductId) -> ProductResult<Vec<ProductId>> {
        self.guarded(UpstreamOperation::ListSimilarIds, product_id, || {
            self.upstream.list_similar_ids(product_id)
        })
        .await
    }

    async fn fetch_details(&self, product_id: &ProductId) -> ProductResult<ProductDetails> {
        self.guarded(UpstreamOperation::FetchDetails, product_id, || {
            self.upstream.fetch_details(product_id)
        })
        .await
    }
}
