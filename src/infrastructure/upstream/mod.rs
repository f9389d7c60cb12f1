//! # Upstream Product Service
//!
//! Port and adapters for the upstream product service.
//!
//! ## Port
//!
//! - [`ProductUpstream`]: list similar ids, fetch one product's details
//!
//! ## Adapters
//!
//! - [`HttpProductUpstream`]: reqwest transport with connect/read timeouts
//! - [`ResilientProductClient`]: circuit breaker + retry + attempt deadline
//!   per operation kind, wrapping any other adapter

pub mod dto;
pub mod http_client;
pub mod resilient;
pub mod traits;

pub use http_client::{HttpProductUpstream, UpstreamSetupError};
pub use resilient::{OperationPolicy, ResilientProductClient};
pub use traits::{ProductUpstream, UpstreamOperation};
