//! # API Layer
//!
//! Inbound interfaces.
//!
//! - [`rest`]: REST endpoints using axum

pub mod rest;
