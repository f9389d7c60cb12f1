//! # Value Objects
//!
//! Immutable types with domain semantics.
//!
//! - [`ProductId`]: opaque string identifier
//! - [`SimilarIdSet`]: ordered, deduplicated listing of similar products

pub mod ids;
pub mod similar_ids;

pub use ids::ProductId;
pub use similar_ids::SimilarIdSet;
