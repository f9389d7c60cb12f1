//! # Use Cases
//!
//! Application use cases driven by the inbound API.
//!
//! - [`GetSimilarProductsUseCase`]: similar product details for one product

pub mod get_similar_products;

pub use get_similar_products::GetSimilarProductsUseCase;
