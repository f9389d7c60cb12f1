//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides application-level services including:
//! - [`CircuitBreaker`]: Fail-fast guard for one upstream operation kind
//! - [`RetryPolicy`]: Bounded retry with backoff for transient failures
//! - [`SimilarityResolver`]: Similar id listing with first-seen deduplication
//! - [`DetailAggregationEngine`]: Concurrent, order-preserving detail fan-out

pub mod circuit_breaker;
pub mod detail_aggregation;
pub mod retry;
pub mod similarity_resolver;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerResult, CircuitState,
};
pub use detail_aggregation::{AggregationConfig, DetailAggregationEngine};
pub use retry::{RetryError, RetryPolicy, RetryResult, Retryable, execute_with_retry};
pub use similarity_resolver::SimilarityResolver;
