//! # Domain Layer
//!
//! Product identifiers, product details, and the error taxonomy shared by
//! every layer above.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::ProductDetails;
pub use errors::{ErrorKind, ProductError, ProductResult};
pub use value_objects::{ProductId, SimilarIdSet};
