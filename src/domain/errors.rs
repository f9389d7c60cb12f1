//! # Product Errors
//!
//! The error taxonomy shared by the upstream client and the aggregation
//! engine.
//!
//! Every failure that leaves the core carries exactly one [`ErrorKind`],
//! the identifier it concerns, and a human readable cause. The cause is for
//! diagnostics only and is never shown to callers.
//!
//! # Examples
//!
//! ```
//! use similar_products::domain::errors::{ErrorKind, ProductError};
//!
//! let error = ProductError::timeout("42", "read timed out");
//! assert_eq!(error.kind(), ErrorKind::Timeout);
//! assert!(error.is_retryable());
//!
//! let error = ProductError::not_found("42");
//! assert!(!error.is_retryable());
//! ```

use crate::domain::value_objects::ProductId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification attached to every failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The product, or one of its similar products, does not exist upstream.
    NotFound,
    /// Upstream answered with a server-side failure.
    UpstreamError,
    /// Upstream did not answer within the deadline.
    Timeout,
    /// Upstream could not be reached at transport level.
    ConnectionFailure,
    /// Anything that does not fit the categories above.
    Unknown,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::NotFound,
        Self::UpstreamError,
        Self::Timeout,
        Self::ConnectionFailure,
        Self::Unknown,
    ];

    /// Returns the kind as a static string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::ConnectionFailure => "CONNECTION_FAILURE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for upstream product operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// Resource absent upstream.
    #[error("product {product_id} not found")]
    NotFound {
        /// The identifier that was looked up.
        product_id: ProductId,
    },

    /// Upstream responded with a server-side failure, or the circuit is open.
    #[error("upstream error for product {product_id}: {message}")]
    Upstream {
        /// The identifier that was looked up.
        product_id: ProductId,
        /// Error message.
        message: String,
        /// HTTP status returned by upstream, when there was a response.
        status: Option<u16>,
    },

    /// Deadline elapsed.
    #[error("timeout for product {product_id}: {message}")]
    Timeout {
        /// The identifier that was looked up.
        product_id: ProductId,
        /// Error message.
        message: String,
        /// Deadline in milliseconds, when known.
        timeout_ms: Option<u64>,
    },

    /// Transport or connection failure.
    #[error("connection failure for product {product_id}: {message}")]
    ConnectionFailure {
        /// The identifier that was looked up.
        product_id: ProductId,
        /// Error message.
        message: String,
    },

    /// Uncategorized failure.
    #[error("unknown error for product {product_id}: {message}")]
    Unknown {
        /// The identifier that was looked up.
        product_id: ProductId,
        /// Error message.
        message: String,
    },
}

impl ProductError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(product_id: impl Into<ProductId>) -> Self {
        Self::NotFound {
            product_id: product_id.into(),
        }
    }

    /// Creates an upstream error without a status code.
    #[must_use]
    pub fn upstream(product_id: impl Into<ProductId>, message: impl Into<String>) -> Self {
        Self::Upstream {
            product_id: product_id.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Creates an upstream error carrying the HTTP status.
    #[must_use]
    pub fn upstream_with_status(
        product_id: impl Into<ProductId>,
        message: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::Upstream {
            product_id: product_id.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(product_id: impl Into<ProductId>, message: impl Into<String>) -> Self {
        Self::Timeout {
            product_id: product_id.into(),
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Creates a timeout error with the elapsed deadline.
    #[must_use]
    pub fn timeout_with_duration(
        product_id: impl Into<ProductId>,
        message: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self::Timeout {
            product_id: product_id.into(),
            message: message.into(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Creates a connection failure.
    #[must_use]
    pub fn connection(product_id: impl Into<ProductId>, message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            product_id: product_id.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown error.
    #[must_use]
    pub fn unknown(product_id: impl Into<ProductId>, message: impl Into<String>) -> Self {
        Self::Unknown {
            product_id: product_id.into(),
            message: message.into(),
        }
    }

    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ConnectionFailure { .. } => ErrorKind::ConnectionFailure,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Returns the identifier this error concerns.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        match self {
            Self::NotFound { product_id }
            | Self::Upstream { product_id, .. }
            | Self::Timeout { product_id, .. }
            | Self::ConnectionFailure { product_id, .. }
            | Self::Unknown { product_id, .. } => product_id,
        }
    }

    /// Returns true if this error is transient and worth retrying.
    ///
    /// Only timeouts and connection failures qualify. Semantic answers and
    /// server-side failures are surfaced as-is.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionFailure { .. })
    }

    /// Returns true if this error says something about upstream health.
    ///
    /// A not-found answer is a healthy upstream giving a semantic response.
    #[must_use]
    pub fn counts_as_failure(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }

    /// Returns the upstream HTTP status, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Result type for product operations.
pub type ProductResult<T> = Result<T, ProductError>;
