//! # Similar Id Set
//!
//! Ordered, duplicate-free sequence of similar product identifiers.

use crate::domain::value_objects::ProductId;
use std::collections::HashSet;
use std::slice;
use std::vec;

/// Ordered set of similar product identifiers.
///
/// Order is first-seen order from the upstream listing. Later duplicates are
/// dropped. The set is immutable once built.
///
/// # Examples
///
/// ```
/// use similar_products::domain::value_objects::{ProductId, SimilarIdSet};
///
/// let ids = SimilarIdSet::from_listing(["2", "3", "2", "4", "3"].map(ProductId::from));
/// let ids: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
/// assert_eq!(ids, ["2", "3", "4"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarIdSet(Vec<ProductId>);

impl SimilarIdSet {
    /// Creates an empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds a set from an upstream listing, keeping the first occurrence
    /// of each identifier.
    #[must_use]
    pub fn from_listing(listing: impl IntoIterator<Item = ProductId>) -> Self {
        let mut seen = HashSet::new();
        let ids = listing
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self(ids)
    }

    /// Returns the number of identifiers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no identifiers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the identifiers in order.
    pub fn iter(&self) -> slice::Iter<'_, ProductId> {
        self.0.iter()
    }

    /// Returns the identifiers as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ProductId] {
        &self.0
    }
}

impl FromIterator<ProductId> for SimilarIdSet {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self::from_listing(iter)
    }
}

impl IntoIterator for SimilarIdSet {
    type Item = ProductId;
    type IntoIter = vec::IntoIter<ProductId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SimilarIdSet {
    type Item = &'a ProductId;
    type IntoIter = slice::Iter<'a, ProductId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
