//! Wire representations of upstream payloads.

use crate::domain::entities::ProductDetails;
use crate::domain::errors::ProductResult;
use crate::domain::value_objects::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier as it appears on the wire: a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    /// `"2"`
    Text(String),
    /// `2`
    Number(serde_json::Number),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<WireId> for ProductId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(text) => ProductId::new(text),
            WireId::Number(number) => ProductId::new(number.to_string()),
        }
    }
}

/// Product details as served by upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetailsDto {
    /// Product identifier.
    pub id: WireId,
    /// Product name.
    pub name: String,
    /// Price, sent as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Whether the product is available.
    pub availability: bool,
}

impl ProductDetailsDto {
    /// Converts to the domain entity.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Unknown` if the payload violates an entity
    /// invariant.
    pub fn into_domain(self) -> ProductResult<ProductDetails> {
        ProductDetails::new(ProductId::from(self.id), self.name, self.price, self.availability)
    }
}

/// Similar id listing as served by upstream. `null` is an empty listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SimilarIdsDto(Option<Vec<WireId>>);

impl SimilarIdsDto {
    /// Converts to product identifiers, keeping upstream order.
    #[must_use]
    pub fn into_domain(self) -> Vec<ProductId> {
        self.0
            .unwrap_or_default()
            .into_iter()
            .map(ProductId::from)
            .collect()
    }
}
