//! # Domain Entities
//!
//! - [`ProductDetails`]: full details of one product

pub mod product;

pub use product::ProductDetails;
