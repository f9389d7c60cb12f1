//! # Product Details Entity
//!
//! Full details of one product as returned by a successful lookup.
//!
//! # Examples
//!
//! ```
//! use rust_decimal::Decimal;
//! use similar_products::domain::entities::ProductDetails;
//!
//! let details = ProductDetails::new("2", "Dress", Decimal::new(1999, 2), true).unwrap();
//! assert_eq!(details.product_id().as_str(), "2");
//! assert!(details.is_available());
//!
//! assert!(ProductDetails::new("2", "Dress", Decimal::new(-1, 0), true).is_err());
//! ```

use crate::domain::errors::{ProductError, ProductResult};
use crate::domain::value_objects::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Details of a single product.
///
/// # Invariants
///
/// - `price` is never negative
/// - Only produced by a lookup that fully succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    product_id: ProductId,
    name: String,
    price: Decimal,
    availability: bool,
}

impl ProductDetails {
    /// Creates product details.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Unknown` if `price` is negative.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        availability: bool,
    ) -> ProductResult<Self> {
        let product_id = product_id.into();
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ProductError::unknown(
                product_id,
                format!("negative price {}", price),
            ));
        }

        Ok(Self {
            product_id,
            name: name.into(),
            price,
            availability,
        })
    }

    /// Returns the product identifier.
    #[inline]
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Returns the product name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the price.
    #[inline]
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Returns true if the product is available.
    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.availability
    }
}
