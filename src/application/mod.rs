//! # Application Layer
//!
//! Orchestrates the upstream client into the similar products flow.
//!
//! - [`services`]: resilience primitives, similarity resolution, detail aggregation
//! - [`use_cases`]: the similar products request
//! - [`error`]: translation of the error taxonomy into outward signals

pub mod error;
pub mod services;
pub mod use_cases;

pub use error::{OutwardSignal, translate};
pub use use_cases::GetSimilarProductsUseCase;
