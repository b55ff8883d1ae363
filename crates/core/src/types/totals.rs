//! Derived cart totals.
//!
//! Pure derivation over the current line set, recomputed on every state
//! change. No I/O.

use rust_decimal::Decimal;

use super::line::CartLine;

/// Monetary total and unit count for a set of cart lines.
///
/// Never negative; zero when the line set is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Sum of `unit_price * quantity` over all lines.
    pub total: Decimal,
    /// Sum of quantities over all lines.
    pub count: u64,
}

impl CartTotals {
    /// Derive totals from a line set.
    #[must_use]
    pub fn of(lines: &[CartLine]) -> Self {
        let total = lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum();
        let count = lines.iter().map(|l| u64::from(l.quantity)).sum();
        Self { total, count }
    }
}
