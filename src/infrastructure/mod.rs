//! # Infrastructure Layer
//!
//! Adapters for external systems.
//!
//! - [`upstream`]: the upstream product service

pub mod upstream;
