//! # Similar Products
//!
//! HTTP service that returns the details of the products similar to a
//! given product.
//!
//! For a product id the service asks an upstream product service for the
//! ids of similar products, then fetches the details of each one
//! concurrently and answers with the details in the upstream's order.
//!
//! ## Architecture
//!
//! ```text
//! api::rest ─▶ application::use_cases ─▶ application::services
//!                                              │
//!                                              ▼
//!                       infrastructure::upstream (resilient ▶ http)
//! ```
//!
//! - [`domain`]: product identifiers, product details, error taxonomy
//! - [`application`]: similarity resolution, detail aggregation, circuit
//!   breaking, retry, error translation
//! - [`infrastructure`]: upstream HTTP transport and its resilience wrapper
//! - [`api`]: inbound REST endpoints
//! - [`config`]: layered configuration
//! - [`telemetry`]: tracing subscriber setup
//!
//! ## Failure semantics
//!
//! A request either returns every similar product or a single error.
//! When several lookups fail, the error of the earliest product in the
//! upstream listing is reported. Errors are classified into five kinds
//! and translated into four outward signals:
//!
//! | Kind                | Signal                |
//! |---------------------|-----------------------|
//! | `NotFound`          | `not found`           |
//! | `Timeout`           | `gateway timeout`     |
//! | `ConnectionFailure` | `service unavailable` |
//! | `UpstreamError`     | `internal error`      |
//! | `Unknown`           | `internal error`      |

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
