//! Line identity: product ids, variations, and composite line keys.
//!
//! A cart line is identified by its product plus the selected variation
//! attributes. The composite [`LineKey`] keeps a plain product and each of
//! its variations on distinct lines.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when normalizing a [`ProductId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The input is empty after trimming.
    #[error("product id cannot be empty")]
    Empty,
}

/// A normalized product identifier.
///
/// Product ids arrive from the catalog as strings or numbers; this type is
/// the single place they are coerced and trimmed. An id that is empty after
/// trimming is rejected here, before any mutation or I/O happens.
///
/// ## Examples
///
/// ```
/// use cartwheel_core::ProductId;
///
/// assert!(ProductId::parse("sku-1042").is_ok());
/// assert!(ProductId::parse("  sku-1042  ").is_ok()); // trimmed
/// assert!(ProductId::parse("   ").is_err());
///
/// let numeric = ProductId::from(1042u64);
/// assert_eq!(numeric.as_str(), "1042");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Parse a `ProductId` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Empty`] if the trimmed input is empty.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ProductId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Selected variation attributes for a cart line.
///
/// Two lines with the same product but different variation attributes are
/// distinct lines. All attributes are optional; a line with no attributes is
/// the plain product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    /// Selected color, if the product varies by color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Selected size, if the product varies by size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Selected storage capacity, if the product varies by storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

impl Variation {
    /// Returns true if no variation attribute is selected.
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        self.color.is_none() && self.size.is_none() && self.storage.is_none()
    }
}

/// Composite identity of a cart line.
///
/// Built as `join('-', [productId, color, size, storage])` with absent
/// attributes omitted. Resolving the same logical (product, variation) pair
/// always yields the same key, independent of call order - the merge
/// protocol depends on this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    /// Resolve the composite key for a product and its selected variation.
    #[must_use]
    pub fn resolve(product: &ProductId, variation: &Variation) -> Self {
        let mut parts = vec![product.as_str()];
        if let Some(color) = variation.color.as_deref() {
            parts.push(color);
        }
        if let Some(size) = variation.size.as_deref() {
            parts.push(size);
        }
        if let Some(storage) = variation.storage.as_deref() {
            parts.push(storage);
        }
        Self(parts.join("-"))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LineKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
