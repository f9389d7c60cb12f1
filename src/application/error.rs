//! # Error Translation
//!
//! Maps the error taxonomy to the signal shown to callers.
//!
//! This is the one place where a [`ProductError`] turns into an outward
//! signal. It does not care whether the error came from the similar-id
//! listing or from any detail lookup.
//!
//! | ErrorKind           | Signal                |
//! |---------------------|-----------------------|
//! | `NotFound`          | `not found`           |
//! | `Timeout`           | `gateway timeout`     |
//! | `ConnectionFailure` | `service unavailable` |
//! | `UpstreamError`     | `internal error`      |
//! | `Unknown`           | `internal error`      |
//!
//! # Examples
//!
//! ```
//! use similar_products::application::error::{OutwardSignal, translate};
//! use similar_products::domain::errors::ProductError;
//!
//! let signal = translate(&"1".into(), &ProductError::not_found("3"));
//! assert_eq!(signal, OutwardSignal::NotFound);
//! assert_eq!(signal.http_status(), 404);
//! ```

use crate::domain::errors::{ErrorKind, ProductError};
use crate::domain::value_objects::ProductId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal reported to the caller for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutwardSignal {
    /// The product or one of its similar products does not exist.
    NotFound,
    /// Upstream did not answer in time.
    GatewayTimeout,
    /// Upstream is unreachable.
    ServiceUnavailable,
    /// Anything else; the cause is not exposed.
    InternalError,
}

impl OutwardSignal {
    /// Returns the signal name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::GatewayTimeout => "gateway timeout",
            Self::ServiceUnavailable => "service unavailable",
            Self::InternalError => "internal error",
        }
    }

    /// Returns the HTTP status code for this signal.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::GatewayTimeout => 504,
            Self::ServiceUnavailable => 503,
            Self::InternalError => 500,
        }
    }

    /// Returns the generic message safe to show to callers.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "Product not found",
            Self::GatewayTimeout => "Timeout error",
            Self::ServiceUnavailable => "Connection error",
            Self::InternalError => "An unexpected error occurred.",
        }
    }
}

impl fmt::Display for OutwardSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for OutwardSignal {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Timeout => Self::GatewayTimeout,
            ErrorKind::ConnectionFailure => Self::ServiceUnavailable,
            ErrorKind::UpstreamError | ErrorKind::Unknown => Self::InternalError,
        }
    }
}

/// Translates an error raised while serving `requested` into its outward
/// signal.
///
/// `UpstreamError` and `Unknown` are logged with the requested identifier,
/// the identifier of the failing upstream call and the upstream cause,
/// since the caller only sees a generic message.
#[must_use]
pub fn translate(requested: &ProductId, error: &ProductError) -> OutwardSignal {
    let kind = error.kind();
    let signal = OutwardSignal::from(kind);

    match kind {
        ErrorKind::UpstreamError | ErrorKind::Unknown => {
            tracing::error!(
                requested_product_id = %requested,
                product_id = %error.product_id(),
                %kind,
                status = ?error.status(),
                cause = %error,
                %signal,
                "similar products request failed"
            );
        }
        ErrorKind::NotFound | ErrorKind::Timeout | ErrorKind::ConnectionFailure => {
            tracing::warn!(
                requested_product_id = %requested,
                product_id = %error.product_id(),
                %kind,
                %signal,
                "similar products request failed"
            );
        }
    }

    signal
}
