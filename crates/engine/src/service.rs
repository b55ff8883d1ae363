//! Cart reconciliation service.
//!
//! Every cart mutation goes through [`CartService`]. The service owns the
//! in-memory [`CartSession`] and decides, per mutation, which source of
//! truth applies:
//!
//! - No bearer token: the mutation applies locally through the stock guard
//!   and identity resolver, and the anonymous cart is persisted.
//! - Token present, session still anonymous: the local cart is first
//!   merged into the account cart (the login transition); if the merge
//!   fails, the user keeps shopping locally and the merge retries on the
//!   next mutation or an explicit [`refresh`](CartService::refresh).
//! - Authenticated: the mutation delegates to the remote client and the
//!   server's full-snapshot response replaces local state. A remote
//!   failure leaves state untouched - there is no silent fallback to the
//!   local store, because an authenticated cart must have one source of
//!   truth.
//!
//! Mutations take `&mut self` and await their network call before
//! returning, so two mutations can never be in flight at once and the
//! most recent snapshot always wins.

use tracing::{instrument, warn};

use cartwheel_core::{
    CartLine, CartMode, CartSession, CartTotals, IdentityError, LineKey, ProductId,
    ProductSnapshot, StockDecision, clamp,
};

use crate::auth::TokenProvider;
use crate::error::CartError;
use crate::remote::{CartSnapshot, RemoteCartApi, RemoteError, RemoteLine, SyncEntry};
use crate::store::{LocalCartStore, StorageBackend, StoreError};

/// Non-fatal notice that a requested quantity exceeded known stock.
///
/// The mutation still succeeded at the clamped value; the caller should
/// tell the user "only N units available" rather than silently reducing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockNotice {
    /// The quantity the caller asked for (for an add: existing plus
    /// added).
    pub requested: i64,
    /// The stock the quantity was clamped to.
    pub available: u32,
}

/// What a successful mutation wants the caller to know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Present when the quantity was clamped against known stock.
    pub clamp: Option<StockNotice>,
    /// True when a bearer token is present but the account merge failed,
    /// so the mutation applied locally. The merge retries on the next
    /// mutation or an explicit refresh.
    pub sync_pending: bool,
}

/// Where a mutation is applied.
enum Route {
    Local,
    Remote,
    /// Token present but the merge failed: apply locally, flag the caller.
    LocalSyncPending,
}

/// Orchestrates the anonymous and authenticated cart sources.
///
/// Constructed with injected store, remote client, and token probe, so
/// tests run against in-memory backends without storage or network.
pub struct CartService<S, R, T> {
    store: LocalCartStore<S>,
    remote: R,
    tokens: T,
    session: CartSession,
}

impl<S, R, T> CartService<S, R, T>
where
    S: StorageBackend,
    R: RemoteCartApi,
    T: TokenProvider,
{
    /// Create a service, restoring any persisted anonymous cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistence backend cannot be read. An
    /// expired or corrupted persisted cart is not an error - it reads as
    /// empty.
    pub fn new(store: LocalCartStore<S>, remote: R, tokens: T) -> Result<Self, StoreError> {
        let lines = store.load()?;
        Ok(Self {
            store,
            remote,
            tokens,
            session: CartSession::anonymous(lines),
        })
    }

    /// The current cart session.
    #[must_use]
    pub const fn session(&self) -> &CartSession {
        &self.session
    }

    /// Totals derived from the current session.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.session.totals()
    }

    /// Add units of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Identity`] for an unusable product id (before
    /// any I/O), or a recoverable error if the active source of truth
    /// cannot be reached or persisted.
    #[instrument(skip(self, snapshot), fields(product_id = %snapshot.product_id))]
    pub async fn add_item(
        &mut self,
        snapshot: &ProductSnapshot,
        quantity: u32,
    ) -> Result<MutationOutcome, CartError> {
        let product_id = ProductId::parse(&snapshot.product_id)?;
        match self.route().await {
            Route::Remote => {
                let server = self
                    .remote
                    .add_item(&product_id, quantity)
                    .await
                    .map_err(CartError::Remote)?;
                self.replace_with(server);
                Ok(MutationOutcome::default())
            }
            route => {
                let mut outcome = self.add_item_local(&product_id, snapshot, quantity)?;
                outcome.sync_pending = matches!(route, Route::LocalSyncPending);
                Ok(outcome)
            }
        }
    }

    /// Set the quantity of an existing line. A quantity of zero or less
    /// removes the line.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error if the active source of truth cannot
    /// be reached or persisted.
    #[instrument(skip(self), fields(line_key = %key))]
    pub async fn set_quantity(
        &mut self,
        key: &LineKey,
        quantity: i64,
    ) -> Result<MutationOutcome, CartError> {
        match self.route().await {
            Route::Remote => {
                let server = self
                    .remote
                    .set_quantity(key, quantity)
                    .await
                    .map_err(CartError::Remote)?;
                self.replace_with(server);
                Ok(MutationOutcome::default())
            }
            route => {
                let mut outcome = self.set_quantity_local(key, quantity)?;
                outcome.sync_pending = matches!(route, Route::LocalSyncPending);
                Ok(outcome)
            }
        }
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error if the active source of truth cannot
    /// be reached or persisted.
    #[instrument(skip(self), fields(line_key = %key))]
    pub async fn remove_item(&mut self, key: &LineKey) -> Result<MutationOutcome, CartError> {
        match self.route().await {
            Route::Remote => {
                let server = self
                    .remote
                    .remove_item(key)
                    .await
                    .map_err(CartError::Remote)?;
                self.replace_with(server);
                Ok(MutationOutcome::default())
            }
            route => {
                self.session.remove(key);
                self.persist()?;
                Ok(MutationOutcome {
                    sync_pending: matches!(route, Route::LocalSyncPending),
                    ..MutationOutcome::default()
                })
            }
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error if the active source of truth cannot
    /// be reached or persisted.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<MutationOutcome, CartError> {
        match self.route().await {
            Route::Remote => {
                let server = self.remote.clear().await.map_err(CartError::Remote)?;
                self.replace_with(server);
                Ok(MutationOutcome::default())
            }
            route => {
                self.session.clear();
                self.persist()?;
                Ok(MutationOutcome {
                    sync_pending: matches!(route, Route::LocalSyncPending),
                    ..MutationOutcome::default()
                })
            }
        }
    }

    /// Re-read the active source of truth.
    ///
    /// Authenticated: fetch the server cart. Anonymous with a token
    /// present: retry the account merge. Anonymous otherwise: re-read the
    /// persisted cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Merge`] if a retried merge fails, or a
    /// recoverable error if the active source cannot be read.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), CartError> {
        match self.session.mode() {
            CartMode::Authenticated => {
                let server = self.remote.get_cart().await.map_err(CartError::Remote)?;
                self.replace_with(server);
                Ok(())
            }
            CartMode::Anonymous if self.tokens.is_authenticated() => self
                .merge_into_account()
                .await
                .map_err(CartError::Merge),
            CartMode::Anonymous => {
                let lines = self.store.load()?;
                self.session = CartSession::anonymous(lines);
                Ok(())
            }
        }
    }

    /// Run the login transition: merge any local cart into the account
    /// cart and adopt the server's state.
    ///
    /// On failure the local cart is left untouched, the session stays
    /// anonymous, and the merge may be retried.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Merge`] if no token is present or the sync
    /// call fails.
    #[instrument(skip(self))]
    pub async fn login(&mut self) -> Result<(), CartError> {
        if self.session.mode() == CartMode::Authenticated {
            return Ok(());
        }
        if !self.tokens.is_authenticated() {
            return Err(CartError::Merge(RemoteError::MissingToken));
        }
        self.merge_into_account().await.map_err(CartError::Merge)
    }

    /// Revert to an empty anonymous session.
    ///
    /// The server cart is not fetched speculatively; it will be read again
    /// on the next login.
    #[instrument(skip(self))]
    pub fn logout(&mut self) {
        self.session = CartSession::empty();
    }

    // =========================================================================
    // Mode selection & merge protocol
    // =========================================================================

    async fn route(&mut self) -> Route {
        match self.session.mode() {
            CartMode::Authenticated => Route::Remote,
            CartMode::Anonymous if self.tokens.is_authenticated() => {
                match self.merge_into_account().await {
                    Ok(()) => Route::Remote,
                    Err(error) => {
                        warn!(%error, "cart merge failed; continuing locally");
                        Route::LocalSyncPending
                    }
                }
            }
            CartMode::Anonymous => Route::Local,
        }
    }

    /// The merge protocol, executed once per login transition.
    ///
    /// An empty local cart skips straight to fetching the existing
    /// account cart. Otherwise every local line becomes a
    /// `{productId, quantity}` entry and the server arbitrates how
    /// overlapping lines combine. Only after the server accepts the merge
    /// is the local entry deleted.
    async fn merge_into_account(&mut self) -> Result<(), RemoteError> {
        let lines = self.session.lines();
        let server = if lines.is_empty() {
            self.remote.get_cart().await?
        } else {
            let entries: Vec<SyncEntry> = lines
                .iter()
                .map(|l| SyncEntry {
                    product_id: l.product_id.clone(),
                    quantity: l.quantity,
                })
                .collect();
            self.remote.sync_cart(&entries).await?
        };

        self.replace_with(server);
        if let Err(error) = self.store.clear() {
            warn!(%error, "failed to delete merged local cart entry");
        }
        Ok(())
    }

    /// Adopt a server snapshot as the authenticated session.
    ///
    /// Lines with unusable product ids are skipped with a warning rather
    /// than failing the whole snapshot.
    fn replace_with(&mut self, snapshot: CartSnapshot) {
        let mut session = CartSession::authenticated(Vec::new());
        for item in snapshot.items {
            match remote_line_to_cart_line(&item) {
                Ok(line) => session.upsert(line),
                Err(error) => {
                    warn!(%error, product_id = %item.product_id, "skipping unusable server cart line");
                }
            }
        }
        self.session = session;
    }

    // =========================================================================
    // Local mutations
    // =========================================================================

    fn add_item_local(
        &mut self,
        product_id: &ProductId,
        snapshot: &ProductSnapshot,
        quantity: u32,
    ) -> Result<MutationOutcome, CartError> {
        let key = LineKey::resolve(product_id, &snapshot.variation);
        let existing = self.session.line(&key).map_or(0, |l| l.quantity);
        let requested = i64::from(existing) + i64::from(quantity);

        let mut outcome = MutationOutcome::default();
        match clamp(requested, snapshot.stock) {
            StockDecision::Remove => {
                self.session.remove(&key);
            }
            StockDecision::Keep(result) => {
                if result.clamped {
                    outcome.clamp = Some(StockNotice {
                        requested,
                        available: snapshot.stock.unwrap_or(0),
                    });
                }
                // A clamp to zero stock never inserts: upsert removes
                // zero-quantity lines
                self.session.upsert(CartLine {
                    key,
                    product_id: product_id.clone(),
                    variation: snapshot.variation.clone(),
                    quantity: result.quantity,
                    unit_price: snapshot.unit_price(),
                    stock_snapshot: snapshot.stock,
                });
            }
        }
        self.persist()?;
        Ok(outcome)
    }

    fn set_quantity_local(
        &mut self,
        key: &LineKey,
        quantity: i64,
    ) -> Result<MutationOutcome, CartError> {
        let mut outcome = MutationOutcome::default();
        let Some(line) = self.session.line(key) else {
            return Ok(outcome);
        };
        let stock = line.stock_snapshot;

        match clamp(quantity, stock) {
            StockDecision::Remove => {
                self.session.remove(key);
            }
            StockDecision::Keep(result) => {
                if result.clamped {
                    outcome.clamp = Some(StockNotice {
                        requested: quantity,
                        available: stock.unwrap_or(0),
                    });
                }
                self.session.set_quantity(key, result.quantity);
            }
        }
        self.persist()?;
        Ok(outcome)
    }

    /// Persist the anonymous session. An empty cart clears the entry.
    fn persist(&self) -> Result<(), StoreError> {
        self.store.save(self.session.lines())
    }
}

fn remote_line_to_cart_line(item: &RemoteLine) -> Result<CartLine, IdentityError> {
    let product_id = ProductId::parse(&item.product_id)?;
    let key = LineKey::resolve(&product_id, &item.variation);
    Ok(CartLine {
        key,
        product_id,
        variation: item.variation.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        stock_snapshot: item.stock,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::dec;
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use cartwheel_core::Variation;

    use crate::auth::TokenHandle;
    use crate::remote::InMemoryRemoteCart;
    use crate::store::{MemoryStore, STORAGE_KEY};

    use super::*;

    struct Rig {
        backend: MemoryStore,
        server: Arc<InMemoryRemoteCart>,
        tokens: TokenHandle,
        service: CartService<MemoryStore, Arc<InMemoryRemoteCart>, TokenHandle>,
    }

    impl Rig {
        fn new() -> Self {
            let backend = MemoryStore::new();
            let server = Arc::new(InMemoryRemoteCart::new());
            let tokens = TokenHandle::new();
            let service = CartService::new(
                LocalCartStore::new(backend.clone()),
                Arc::clone(&server),
                tokens.clone(),
            )
            .unwrap();
            Self {
                backend,
                server,
                tokens,
                service,
            }
        }

        fn sign_in(&self) {
            self.tokens.set(SecretString::from("bearer-token"));
        }

        fn persisted(&self) -> Option<String> {
            self.backend.get(STORAGE_KEY).unwrap()
        }
    }

    fn snapshot(id: &str, price: Decimal, stock: Option<u32>) -> ProductSnapshot {
        ProductSnapshot {
            product_id: id.to_string(),
            variation: Variation::default(),
            price,
            discount_price: None,
            stock,
        }
    }

    fn key_of(id: &str) -> LineKey {
        LineKey::resolve(
            &ProductId::parse(id).unwrap(),
            &Variation::default(),
        )
    }

    // =========================================================================
    // Anonymous mode
    // =========================================================================

    #[tokio::test]
    async fn test_anonymous_add_persists() {
        let mut rig = Rig::new();
        let outcome = rig
            .service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 2)
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::default());
        assert_eq!(rig.service.session().mode(), CartMode::Anonymous);
        assert_eq!(rig.service.totals().count, 2);
        assert!(rig.persisted().is_some());
    }

    #[tokio::test]
    async fn test_anonymous_add_clamps_with_notice() {
        let mut rig = Rig::new();
        let outcome = rig
            .service
            .add_item(&snapshot("p1", dec!(10), Some(3)), 5)
            .await
            .unwrap();

        assert_eq!(
            outcome.clamp,
            Some(StockNotice {
                requested: 5,
                available: 3
            })
        );
        assert_eq!(rig.service.totals().count, 3);
    }

    #[tokio::test]
    async fn test_anonymous_repeat_add_accumulates_then_clamps() {
        let mut rig = Rig::new();
        let item = snapshot("p1", dec!(10), Some(5));
        rig.service.add_item(&item, 3).await.unwrap();
        let outcome = rig.service.add_item(&item, 4).await.unwrap();

        assert_eq!(
            outcome.clamp,
            Some(StockNotice {
                requested: 7,
                available: 5
            })
        );
        assert_eq!(rig.service.totals().count, 5);
        assert_eq!(rig.service.session().lines().len(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_unknown_stock_never_blocks() {
        let mut rig = Rig::new();
        let outcome = rig
            .service
            .add_item(&snapshot("p1", dec!(10), None), 250)
            .await
            .unwrap();
        assert!(outcome.clamp.is_none());
        assert_eq!(rig.service.totals().count, 250);
    }

    #[tokio::test]
    async fn test_variations_occupy_distinct_lines() {
        let mut rig = Rig::new();
        let plain = snapshot("p1", dec!(10), None);
        let red = ProductSnapshot {
            variation: Variation {
                color: Some("red".to_string()),
                ..Variation::default()
            },
            ..plain.clone()
        };
        rig.service.add_item(&plain, 1).await.unwrap();
        rig.service.add_item(&red, 1).await.unwrap();

        assert_eq!(rig.service.session().lines().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_product_id_rejected_before_persisting() {
        let mut rig = Rig::new();
        let err = rig
            .service
            .add_item(&snapshot("   ", dec!(10), None), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Identity(_)));
        assert!(!err.is_recoverable());
        assert!(rig.persisted().is_none());
    }

    #[tokio::test]
    async fn test_set_quantity_nonpositive_removes() {
        let mut rig = Rig::new();
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 2)
            .await
            .unwrap();

        let outcome = rig.service.set_quantity(&key_of("p1"), 0).await.unwrap();
        assert!(outcome.clamp.is_none());
        assert!(rig.service.session().is_empty());
    }

    #[tokio::test]
    async fn test_removing_last_line_clears_backend() {
        let mut rig = Rig::new();
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 2)
            .await
            .unwrap();
        assert!(rig.persisted().is_some());

        rig.service.remove_item(&key_of("p1")).await.unwrap();
        // Cleared, not saved as an empty payload
        assert!(rig.persisted().is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_session_and_backend() {
        let mut rig = Rig::new();
        rig.service
            .add_item(&snapshot("p1", dec!(10), None), 2)
            .await
            .unwrap();
        rig.service.clear().await.unwrap();

        assert!(rig.service.session().is_empty());
        assert!(rig.persisted().is_none());
    }

    #[tokio::test]
    async fn test_discount_price_used_for_totals() {
        let mut rig = Rig::new();
        let discounted = ProductSnapshot {
            discount_price: Some(dec!(50)),
            ..snapshot("p2", dec!(100), None)
        };
        rig.service
            .add_item(&snapshot("p1", dec!(100), None), 2)
            .await
            .unwrap();
        rig.service.add_item(&discounted, 3).await.unwrap();

        let totals = rig.service.totals();
        assert_eq!(totals.total, dec!(350));
        assert_eq!(totals.count, 5);
    }

    // =========================================================================
    // Login transition
    // =========================================================================

    #[tokio::test]
    async fn test_login_merges_local_cart_and_clears_store() {
        let mut rig = Rig::new();
        let p1 = ProductId::parse("p1").unwrap();
        rig.server.seed_product(&p1, dec!(12), Some(10));
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(10)), 2)
            .await
            .unwrap();

        rig.sign_in();
        rig.service.login().await.unwrap();

        assert_eq!(rig.service.session().mode(), CartMode::Authenticated);
        // Server truth replaces the local snapshot, including its price
        assert_eq!(rig.service.totals().count, 2);
        assert_eq!(rig.service.totals().total, dec!(24));
        assert!(rig.persisted().is_none());
    }

    #[tokio::test]
    async fn test_login_with_empty_local_adopts_account_cart() {
        let mut rig = Rig::new();
        let p9 = ProductId::parse("p9").unwrap();
        rig.server.seed_product(&p9, dec!(5), None);
        rig.server.add_item(&p9, 4).await.unwrap();

        rig.sign_in();
        rig.service.login().await.unwrap();

        assert_eq!(rig.service.session().mode(), CartMode::Authenticated);
        assert_eq!(rig.service.totals().count, 4);
    }

    #[tokio::test]
    async fn test_login_failure_preserves_local_cart() {
        let mut rig = Rig::new();
        rig.service
            .add_item(&snapshot("p1", dec!(10), None), 2)
            .await
            .unwrap();
        let before = rig.service.session().clone();

        rig.sign_in();
        rig.server.set_offline(true);
        let err = rig.service.login().await.unwrap_err();

        assert!(matches!(err, CartError::Merge(_)));
        assert!(err.is_recoverable());
        assert_eq!(rig.service.session(), &before);
        assert!(rig.persisted().is_some());
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let mut rig = Rig::new();
        let err = rig.service.login().await.unwrap_err();
        assert!(matches!(
            err,
            CartError::Merge(RemoteError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_mutation_with_fresh_token_merges_first() {
        let mut rig = Rig::new();
        let p1 = ProductId::parse("p1").unwrap();
        let p2 = ProductId::parse("p2").unwrap();
        rig.server.seed_product(&p1, dec!(10), Some(10));
        rig.server.seed_product(&p2, dec!(20), Some(10));
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(10)), 2)
            .await
            .unwrap();

        rig.sign_in();
        // No explicit login(): the next mutation triggers the merge
        rig.service
            .add_item(&snapshot("p2", dec!(20), Some(10)), 1)
            .await
            .unwrap();

        assert_eq!(rig.service.session().mode(), CartMode::Authenticated);
        assert_eq!(rig.service.totals().count, 3);
        assert!(rig.persisted().is_none());
    }

    #[tokio::test]
    async fn test_mutation_with_failed_merge_applies_locally() {
        let mut rig = Rig::new();
        rig.service
            .add_item(&snapshot("p1", dec!(10), None), 1)
            .await
            .unwrap();

        rig.sign_in();
        rig.server.set_offline(true);
        let outcome = rig
            .service
            .add_item(&snapshot("p1", dec!(10), None), 1)
            .await
            .unwrap();

        assert!(outcome.sync_pending);
        assert_eq!(rig.service.session().mode(), CartMode::Anonymous);
        assert_eq!(rig.service.totals().count, 2);
        assert!(rig.persisted().is_some());
    }

    #[tokio::test]
    async fn test_refresh_retries_failed_merge() {
        let mut rig = Rig::new();
        let p1 = ProductId::parse("p1").unwrap();
        rig.server.seed_product(&p1, dec!(10), Some(10));
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(10)), 2)
            .await
            .unwrap();

        rig.sign_in();
        rig.server.set_offline(true);
        assert!(rig.service.login().await.is_err());

        rig.server.set_offline(false);
        rig.service.refresh().await.unwrap();
        assert_eq!(rig.service.session().mode(), CartMode::Authenticated);
        assert_eq!(rig.service.totals().count, 2);
    }

    // =========================================================================
    // Authenticated mode
    // =========================================================================

    async fn authenticated_rig() -> Rig {
        let mut rig = Rig::new();
        let p1 = ProductId::parse("p1").unwrap();
        rig.server.seed_product(&p1, dec!(10), Some(5));
        rig.sign_in();
        rig.service.login().await.unwrap();
        rig
    }

    #[tokio::test]
    async fn test_authenticated_add_adopts_server_truth() {
        let mut rig = authenticated_rig().await;
        // Server clamps to its own stock of 5
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 9)
            .await
            .unwrap();

        assert_eq!(rig.service.totals().count, 5);
        // Authenticated mutations never touch the local store
        assert!(rig.persisted().is_none());
    }

    #[tokio::test]
    async fn test_authenticated_failure_leaves_state_unchanged() {
        let mut rig = authenticated_rig().await;
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 2)
            .await
            .unwrap();
        let before = rig.service.session().clone();

        rig.server.set_offline(true);
        let err = rig
            .service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Remote(_)));
        assert!(err.is_recoverable());
        assert_eq!(rig.service.session(), &before);
    }

    #[tokio::test]
    async fn test_authenticated_set_quantity_and_remove() {
        let mut rig = authenticated_rig().await;
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 3)
            .await
            .unwrap();

        rig.service.set_quantity(&key_of("p1"), 1).await.unwrap();
        assert_eq!(rig.service.totals().count, 1);

        rig.service.remove_item(&key_of("p1")).await.unwrap();
        assert!(rig.service.session().is_empty());
    }

    #[tokio::test]
    async fn test_logout_reverts_to_empty_anonymous() {
        let mut rig = authenticated_rig().await;
        rig.service
            .add_item(&snapshot("p1", dec!(10), Some(5)), 2)
            .await
            .unwrap();

        rig.tokens.clear();
        rig.service.logout();

        assert_eq!(rig.service.session().mode(), CartMode::Anonymous);
        assert!(rig.service.session().is_empty());
        assert_eq!(rig.service.totals(), CartTotals::default());
    }

    #[tokio::test]
    async fn test_refresh_fetches_server_cart_when_authenticated() {
        let mut rig = authenticated_rig().await;
        let p1 = ProductId::parse("p1").unwrap();
        // Another device adds to the account cart behind our back
        rig.server.add_item(&p1, 4).await.unwrap();
        assert_eq!(rig.service.totals().count, 0);

        rig.service.refresh().await.unwrap();
        assert_eq!(rig.service.totals().count, 4);
    }
}
