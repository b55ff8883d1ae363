//! Cart sessions: the aggregate of cart lines plus ownership mode.

use serde::{Deserialize, Serialize};

use super::id::LineKey;
use super::line::CartLine;
use super::totals::CartTotals;

/// Who owns the cart state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartMode {
    /// Cart state owned entirely by the client; no server record.
    Anonymous,
    /// Cart state owned by the server; the client holds a cached mirror.
    Authenticated,
}

/// The aggregate root of the cart engine.
///
/// Lines are unique by [`LineKey`] and kept in insertion order. All
/// mutation helpers preserve the quantity invariant: a line is never held
/// at quantity zero - applying a zero quantity removes the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSession {
    mode: CartMode,
    lines: Vec<CartLine>,
}

impl CartSession {
    /// Create an empty anonymous session.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            mode: CartMode::Anonymous,
            lines: Vec::new(),
        }
    }

    /// Create an anonymous session from persisted lines.
    #[must_use]
    pub const fn anonymous(lines: Vec<CartLine>) -> Self {
        Self {
            mode: CartMode::Anonymous,
            lines,
        }
    }

    /// Create an authenticated session mirroring server state.
    #[must_use]
    pub const fn authenticated(lines: Vec<CartLine>) -> Self {
        Self {
            mode: CartMode::Authenticated,
            lines,
        }
    }

    /// The session's ownership mode.
    #[must_use]
    pub const fn mode(&self) -> CartMode {
        self.mode
    }

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns true if the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by its key.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.key == key)
    }

    /// Derive totals from the current line set.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::of(&self.lines)
    }

    /// Insert a line, or replace the existing line with the same key.
    ///
    /// A zero-quantity line is treated as a removal.
    pub fn upsert(&mut self, line: CartLine) {
        if line.quantity == 0 {
            self.remove(&line.key);
            return;
        }
        match self.lines.iter_mut().find(|l| l.key == line.key) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
    }

    /// Set the quantity of an existing line. Zero removes the line; a
    /// missing key is a no-op. Returns true if a line was changed.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(key);
        }
        if let Some(line) = self.lines.iter_mut().find(|l| &l.key == key) {
            line.quantity = quantity;
            true
        } else {
            false
        }
    }

    /// Remove a line by key. Returns true if a line was removed.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.key != key);
        self.lines.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for CartSession {
    fn default() -> Self {
        Self::empty()
    }
}
