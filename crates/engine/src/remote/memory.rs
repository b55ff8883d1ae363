//! In-process reference implementation of the cart API.
//!
//! Models the server's observable behavior: additive adds clamped to the
//! server's own stock, full-snapshot responses, and the bulk merge used at
//! login. Tests use it to drive the engine without a network; failure
//! injection simulates outages.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use rust_decimal::Decimal;
use tracing::warn;

use cartwheel_core::{LineKey, ProductId, StockDecision, Variation, clamp};

use super::{CartSnapshot, MergePolicy, RemoteCartApi, RemoteError, RemoteLine, SyncEntry};

/// A product the server knows how to sell.
#[derive(Debug, Clone)]
struct Listing {
    price: Decimal,
    stock: Option<u32>,
}

/// One line of the server cart.
#[derive(Debug, Clone)]
struct ServerLine {
    key: LineKey,
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Default)]
struct ServerState {
    lines: Vec<ServerLine>,
    catalog: HashMap<ProductId, Listing>,
    offline: bool,
}

/// In-memory cart server.
///
/// Seed products with [`seed_product`](Self::seed_product) before adding
/// them; an unseeded product is rejected with HTTP 404 semantics, the way
/// a real catalog-backed cart API would.
#[derive(Debug)]
pub struct InMemoryRemoteCart {
    policy: MergePolicy,
    state: Mutex<ServerState>,
}

impl InMemoryRemoteCart {
    /// Create a server with the default (last-write-wins) merge policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(MergePolicy::default())
    }

    /// Create a server with an explicit merge policy.
    #[must_use]
    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(ServerState::default()),
        }
    }

    /// Make a product purchasable.
    pub fn seed_product(&self, product_id: &ProductId, price: Decimal, stock: Option<u32>) {
        let mut state = self.lock();
        state
            .catalog
            .insert(product_id.clone(), Listing { price, stock });
    }

    /// Simulate an outage: while offline, every call fails with
    /// [`RemoteError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// The current server cart, for test assertions.
    #[must_use]
    pub fn current_snapshot(&self) -> CartSnapshot {
        Self::render(&self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guard(state: &ServerState) -> Result<(), RemoteError> {
        if state.offline {
            return Err(RemoteError::Unavailable("injected outage".to_string()));
        }
        Ok(())
    }

    fn render(state: &ServerState) -> CartSnapshot {
        let items = state
            .lines
            .iter()
            .filter_map(|line| {
                let Some(listing) = state.catalog.get(&line.product_id) else {
                    warn!(product_id = %line.product_id, "server line without listing");
                    return None;
                };
                Some(RemoteLine {
                    product_id: line.product_id.as_str().to_owned(),
                    variation: Variation::default(),
                    quantity: line.quantity,
                    unit_price: listing.price,
                    stock: listing.stock,
                })
            })
            .collect();
        CartSnapshot { items }
    }

    fn apply_quantity(state: &mut ServerState, product_id: &ProductId, requested: i64) {
        let key = LineKey::resolve(product_id, &Variation::default());
        let stock = state
            .catalog
            .get(product_id)
            .and_then(|listing| listing.stock);
        match clamp(requested, stock) {
            StockDecision::Remove => state.lines.retain(|l| l.key != key),
            StockDecision::Keep(result) if result.quantity == 0 => {
                state.lines.retain(|l| l.key != key);
            }
            StockDecision::Keep(result) => {
                if let Some(line) = state.lines.iter_mut().find(|l| l.key == key) {
                    line.quantity = result.quantity;
                } else {
                    state.lines.push(ServerLine {
                        key,
                        product_id: product_id.clone(),
                        quantity: result.quantity,
                    });
                }
            }
        }
    }
}

impl Default for InMemoryRemoteCart {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteCartApi for InMemoryRemoteCart {
    async fn get_cart(&self) -> Result<CartSnapshot, RemoteError> {
        let state = self.lock();
        Self::guard(&state)?;
        Ok(Self::render(&state))
    }

    async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, RemoteError> {
        let mut state = self.lock();
        Self::guard(&state)?;

        if !state.catalog.contains_key(product_id) {
            return Err(RemoteError::Api {
                status: 404,
                message: format!("unknown product: {product_id}"),
            });
        }

        let key = LineKey::resolve(product_id, &Variation::default());
        let existing = state
            .lines
            .iter()
            .find(|l| l.key == key)
            .map_or(0, |l| l.quantity);
        // Adds are additive, clamped to the server's own stock
        let requested = i64::from(existing) + i64::from(quantity);
        Self::apply_quantity(&mut state, product_id, requested);
        Ok(Self::render(&state))
    }

    async fn remove_item(&self, key: &LineKey) -> Result<CartSnapshot, RemoteError> {
        let mut state = self.lock();
        Self::guard(&state)?;
        state.lines.retain(|l| &l.key != key);
        Ok(Self::render(&state))
    }

    async fn set_quantity(&self, key: &LineKey, quantity: i64) -> Result<CartSnapshot, RemoteError> {
        let mut state = self.lock();
        Self::guard(&state)?;

        let Some(product_id) = state
            .lines
            .iter()
            .find(|l| &l.key == key)
            .map(|l| l.product_id.clone())
        else {
            return Ok(Self::render(&state));
        };
        Self::apply_quantity(&mut state, &product_id, quantity);
        Ok(Self::render(&state))
    }

    async fn clear(&self) -> Result<CartSnapshot, RemoteError> {
        let mut state = self.lock();
        Self::guard(&state)?;
        state.lines.clear();
        Ok(Self::render(&state))
    }

    async fn sync_cart(&self, entries: &[SyncEntry]) -> Result<CartSnapshot, RemoteError> {
        let mut state = self.lock();
        Self::guard(&state)?;

        for entry in entries {
            if !state.catalog.contains_key(&entry.product_id) {
                return Err(RemoteError::Api {
                    status: 404,
                    message: format!("unknown product: {}", entry.product_id),
                });
            }
            let key = LineKey::resolve(&entry.product_id, &Variation::default());
            let existing = state
                .lines
                .iter()
                .find(|l| l.key == key)
                .map_or(0, |l| l.quantity);
            let combined = self.policy.combine(existing, entry.quantity);
            Self::apply_quantity(&mut state, &entry.product_id, i64::from(combined));
        }
        Ok(Self::render(&state))
    }
}
