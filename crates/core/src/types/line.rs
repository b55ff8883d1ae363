//! Cart lines and the catalog snapshot they are built from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{LineKey, ProductId, Variation};

/// One purchasable unit in a cart.
///
/// Lines are keyed by [`LineKey`], unique within a cart; insertion order is
/// preserved for display. The quantity invariant is that a persisted line
/// always holds `quantity >= 1` - a mutation that would drive it to zero or
/// below removes the line instead (enforced by
/// [`CartSession`](super::session::CartSession)).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Composite identity, unique within a cart.
    pub key: LineKey,
    /// Canonical product identifier.
    pub product_id: ProductId,
    /// Selected variation attributes.
    #[serde(default)]
    pub variation: Variation,
    /// Units of this line in the cart. Always >= 1.
    pub quantity: u32,
    /// Effective price captured at add-time: the discount price if one was
    /// present, else the regular price. Never recomputed from later catalog
    /// changes.
    pub unit_price: Decimal,
    /// Last known available stock for this product. Used only to clamp,
    /// not treated as real-time truth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_snapshot: Option<u32>,
}

/// Catalog data captured at the moment an item is added to the cart.
///
/// The catalog service supplies price, discount price, and stock at
/// add-time; the engine snapshots these values and does not poll for
/// updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    /// Raw product identifier as supplied by the catalog. Normalized by
    /// [`ProductId::parse`] at the mutation boundary.
    pub product_id: String,
    /// Selected variation attributes.
    pub variation: Variation,
    /// Regular price.
    pub price: Decimal,
    /// Discounted price, when a discount applies.
    pub discount_price: Option<Decimal>,
    /// Available stock, when the catalog knows it.
    pub stock: Option<u32>,
}

impl ProductSnapshot {
    /// The effective unit price: the discount price if present, else the
    /// regular price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }
}
