//! # Detail Aggregation Engine
//!
//! Concurrent fan-out of product detail lookups.
//!
//! This module provides the [`DetailAggregationEngine`] which fetches the
//! details of every identifier in a [`SimilarIdSet`] concurrently and joins
//! them back in input order.
//!
//! # Guarantees
//!
//! - One task per identifier, all joined before returning
//! - Output position `i` is the details of input position `i`
//! - Whole-or-nothing: any failure fails the aggregate, reported for the
//!   lowest failing input index
//! - Dropping the aggregate future aborts its in-flight tasks
//!
//! Tasks run on a worker pool bounded by a semaphore shared by every request
//! that goes through the same engine.

use crate::domain::entities::ProductDetails;
use crate::domain::errors::{ProductError, ProductResult};
use crate::domain::value_objects::{ProductId, SimilarIdSet};
use crate::infrastructure::upstream::ProductUpstream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Default upper bound on concurrently running detail lookups.
const DEFAULT_MAX_CONCURRENCY: usize = 256;

/// Configuration for detail aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Maximum detail lookups in flight across all requests.
    pub max_concurrency: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl AggregationConfig {
    /// Sets the maximum number of concurrent lookups.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}

/// Engine for fetching product details concurrently.
#[derive(Debug)]
pub struct DetailAggregationEngine {
    upstream: Arc<dyn ProductUpstream>,
    pool: Arc<Semaphore>,
    config: AggregationConfig,
}

impl DetailAggregationEngine {
    /// Creates a new DetailAggregationEngine.
    #[must_use]
    pub fn new(upstream: Arc<dyn ProductUpstream>, config: AggregationConfig) -> Self {
        let permits = config.max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            upstream,
            pool: Arc::new(Semaphore::new(permits)),
            config,
        }
    }

    /// Creates a new engine with default configuration.
    #[must_use]
    pub fn with_defaults(upstream: Arc<dyn ProductUpstream>) -> Self {
        Self::new(upstream, AggregationConfig::default())
    }

    /// Fetches the details of every identifier, in input order.
    ///
    /// An empty set returns an empty list without calling upstream.
    ///
    /// # Errors
    ///
    /// Once every task has finished, returns the error of the lowest input
    /// index that failed. A task that panicked is reported as
    /// `ProductError::Unknown`.
    pub async fn aggregate(&self, ids: &SimilarIdSet) -> ProductResult<Vec<ProductDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(ids.len());

        for (index, product_id) in ids.iter().cloned().enumerate() {
            let upstream = Arc::clone(&self.upstream);
            let pool = Arc::clone(&self.pool);

            let handle = tasks.spawn(async move {
                let _permit = pool
                    .acquire_owned()
                    .await
                    .map_err(|_| ProductError::unknown(&product_id, "worker pool closed"))?;
                upstream.fetch_details(&product_id).await
            });

            positions.insert(handle.id(), index);
        }

        // Collect results by input position
        let mut slots: Vec<Option<ProductResult<ProductDetails>>> = vec![None; ids.len()];

        while let Some(joined) = tasks.join_next_with_id().await {
            let (task_id, outcome) = match joined {
                Ok((task_id, outcome)) => (task_id, Ok(outcome)),
                Err(join_error) => (join_error.id(), Err(join_error)),
            };
            let Some(&index) = positions.get(&task_id) else {
                continue;
            };
            let product_id = ids.as_slice().get(index);

            let outcome = outcome.unwrap_or_else(|join_error| {
                Err(ProductError::unknown(
                    product_id.cloned().unwrap_or_else(|| ProductId::new("")),
                    format!("detail task failed: {}", join_error),
                ))
            });

            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(outcome);
            }
        }

        let mut details = Vec::with_capacity(ids.len());
        for (index, (product_id, slot)) in ids.iter().zip(slots).enumerate() {
            let outcome = slot.unwrap_or_else(|| {
                Err(ProductError::unknown(product_id, "detail task produced no result"))
            });
            match outcome {
                Ok(product) => details.push(product),
                Err(error) => {
                    tracing::debug!(
                        index,
                        product_id = %product_id,
                        kind = %error.kind(),
                        requested = ids.len(),
                        "detail aggregation failed"
                    );
                    return Err(error);
                }
            }
        }

        Ok(details)
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Returns the number of idle workers in the pool.
    #[must_use]
    pub fn available_workers(&self) -> usize {
        self.pool.available_permits()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Per-id scripted behaviour.
    #[derive(Debug, Clone)]
    enum Script {
        Found { delay_ms: u64 },
        Fail { delay_ms: u64, error: ProductError },
        Panic,
    }

    #[derive(Debug, Default)]
    struct MockUpstream {
        scripts: HashMap<String, Script>,
        calls: AtomicUsize,
        completed: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockUpstream {
        fn new(scripts: Vec<(&str, Script)>) -> Self {
            Self {
                scripts: scripts
                    .into_iter()
                    .map(|(id, script)| (id.to_string(), script))
                    .collect(),
                ..Default::default()
            }
        }
    }

    fn found(delay_ms: u64) -> Script {
        Script::Found { delay_ms }
    }

    fn product(id: &ProductId) -> ProductDetails {
        ProductDetails::new(id, format!("Product {}", id), Decimal::new(995, 2), true).unwrap()
    }

    #[async_trait]
    impl ProductUpstream for MockUpstream {
        async fn list_similar_ids(&self, product_id: &ProductId) -> ProductResult<Vec<ProductId>> {
            Err(ProductError::unknown(product_id, "not used"))
        }

        async fn fetch_details(&self, product_id: &ProductId) -> ProductResult<ProductDetails> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let script = self
                .scripts
                .get(product_id.as_str())
                .cloned()
                .unwrap_or(Script::Found { delay_ms: 0 });

            let result = match script {
                Script::Found { delay_ms } => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Ok(product(product_id))
                }
                Script::Fail { delay_ms, error } => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Err(error)
                }
                Script::Panic => panic!("upstream mock exploded"),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    fn id_set(raw: &[&str]) -> SimilarIdSet {
        SimilarIdSet::from_listing(raw.iter().copied().map(ProductId::from))
    }

    fn ids_of(details: &[ProductDetails]) -> Vec<&str> {
        details.iter().map(|d| d.product_id().as_str()).collect()
    }

    #[tokio::test]
    async fn empty_input_issues_no_upstream_call() {
        let upstream = Arc::new(MockUpstream::default());
        let engine = DetailAggregationEngine::with_defaults(upstream.clone());

        let result = engine.aggregate(&SimilarIdSet::empty()).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn output_follows_input_order_not_completion_order() {
        let upstream = Arc::new(MockUpstream::new(vec![
            ("2", found(300)),
            ("3", found(200)),
            ("4", found(100)),
            ("5", found(0)),
        ]));
        let engine = DetailAggregationEngine::with_defaults(upstream.clone());

        let result = engine.aggregate(&id_set(&["2", "3", "4", "5"])).await.unwrap();

        assert_eq!(ids_of(&result), ["2", "3", "4", "5"]);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_bounded_by_slowest_lookup() {
        let upstream = Arc::new(MockUpstream::new(vec![
            ("2", found(100)),
            ("3", found(100)),
            ("4", found(100)),
        ]));
        let engine = DetailAggregationEngine::with_defaults(upstream);
        let started = tokio::time::Instant::now();

        engine.aggregate(&id_set(&["2", "3", "4"])).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn single_failure_fails_whole_aggregate_after_all_tasks_finish() {
        let upstream = Arc::new(MockUpstream::new(vec![
            ("2", found(50)),
            (
                "3",
                Script::Fail {
                    delay_ms: 0,
                    error: ProductError::not_found("3"),
                },
            ),
            ("4", found(100)),
        ]));
        let engine = DetailAggregationEngine::with_defaults(upstream.clone());

        let result = engine.aggregate(&id_set(&["2", "3", "4"])).await;

        assert_eq!(result, Err(ProductError::not_found("3")));
        assert_eq!(upstream.completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn lowest_failing_index_wins_regardless_of_timing() {
        for _ in 0..20 {
            let upstream = Arc::new(MockUpstream::new(vec![
                ("2", found(0)),
                (
                    "3",
                    Script::Fail {
                        delay_ms: 80,
                        error: ProductError::timeout("3", "slow"),
                    },
                ),
                (
                    "4",
                    Script::Fail {
                        delay_ms: 0,
                        error: ProductError::connection("4", "refused"),
                    },
                ),
            ]));
            let engine = DetailAggregationEngine::with_defaults(upstream);

            let error = engine.aggregate(&id_set(&["2", "3", "4"])).await.unwrap_err();

            assert_eq!(error.kind(), ErrorKind::Timeout);
            assert_eq!(error.product_id().as_str(), "3");
        }
    }

    #[tokio::test]
    async fn panicking_task_is_reported_as_unknown() {
        let upstream = Arc::new(MockUpstream::new(vec![("3", Script::Panic)]));
        let engine = DetailAggregationEngine::with_defaults(upstream);

        let error = engine.aggregate(&id_set(&["2", "3"])).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert_eq!(error.product_id().as_str(), "3");
    }

    #[tokio::test(start_paused = true)]
    async fn pool_bounds_concurrent_lookups() {
        let upstream = Arc::new(MockUpstream::new(
            ["1", "2", "3", "4", "5", "6"]
                .into_iter()
                .map(|id| (id, found(10)))
                .collect(),
        ));
        let engine = DetailAggregationEngine::new(
            upstream.clone(),
            AggregationConfig::default().with_max_concurrency(2),
        );

        let result = engine
            .aggregate(&id_set(&["1", "2", "3", "4", "5", "6"]))
            .await
            .unwrap();

        assert_eq!(result.len(), 6);
        assert!(upstream.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(engine.available_workers(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_aggregate_aborts_in_flight_tasks() {
        let upstream = Arc::new(MockUpstream::new(vec![("2", found(1_000)), ("3", found(1_000))]));
        let engine = DetailAggregationEngine::with_defaults(upstream.clone());

        let timed_out = tokio::time::timeout(
            Duration::from_millis(10),
            engine.aggregate(&id_set(&["2", "3"])),
        )
        .await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(upstream.completed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn aggregation_config_default() {
        let config = AggregationConfig::default();
        assert_eq!(config.max_concurrency, 256);
        assert_eq!(
            AggregationConfig::default().with_max_concurrency(8).max_concurrency,
            8
        );
    }
}
