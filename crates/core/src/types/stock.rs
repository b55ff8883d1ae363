//! Stock-aware quantity clamping.
//!
//! Every quantity mutation passes through [`clamp`] before it reaches the
//! cart, so a line can never exceed the last known stock for its product.

/// A clamped quantity and whether clamping actually reduced it.
///
/// When `clamped` is true the caller must report that the requested amount
/// could not be reached (e.g. "only N units available") rather than
/// silently reducing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamped {
    /// The quantity to apply. Within `[0, stock]` when stock is known.
    pub quantity: u32,
    /// True if the requested quantity exceeded the known stock.
    pub clamped: bool,
}

/// What a requested quantity means for the target line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecision {
    /// The request drives the line to zero or below: remove it. Never
    /// reported as a clamp.
    Remove,
    /// Keep the line at the given quantity.
    Keep(Clamped),
}

/// Clamp a requested quantity against the last known stock.
///
/// A request of zero or less always yields [`StockDecision::Remove`].
/// Unknown stock never blocks a mutation: the request passes through
/// unclamped.
#[must_use]
pub fn clamp(requested: i64, stock: Option<u32>) -> StockDecision {
    if requested <= 0 {
        return StockDecision::Remove;
    }
    // Above zero and within u32 after the stock ceiling
    let requested = u32::try_from(requested).unwrap_or(u32::MAX);
    match stock {
        Some(stock) if requested > stock => StockDecision::Keep(Clamped {
            quantity: stock,
            clamped: true,
        }),
        _ => StockDecision::Keep(Clamped {
            quantity: requested,
            clamped: false,
        }),
    }
}
