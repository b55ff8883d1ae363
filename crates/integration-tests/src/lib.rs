//! Integration tests for Cartwheel.
//!
//! Exercises the reconciliation engine end to end against in-memory
//! backends: no disk, no network, no real cart API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartwheel-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_reconciliation` - The anonymous-to-authenticated merge protocol
//! - `cart_lifecycle` - Persistence, expiry, and corruption across restarts

use std::sync::{Arc, Once};

use rust_decimal::Decimal;
use secrecy::SecretString;

use cartwheel_core::{ProductId, ProductSnapshot, Variation};
use cartwheel_engine::{
    CartService, InMemoryRemoteCart, LocalCartStore, MemoryStore, TokenHandle,
};

/// The engine wired entirely to in-memory collaborators.
pub type TestService = CartService<MemoryStore, Arc<InMemoryRemoteCart>, TokenHandle>;

/// Shared test fixture: the engine plus handles to its collaborators.
pub struct TestContext {
    /// The persistence backend behind the local cart store.
    pub backend: MemoryStore,
    /// The in-process cart server.
    pub server: Arc<InMemoryRemoteCart>,
    /// The shared bearer-token slot.
    pub tokens: TokenHandle,
    /// The engine under test.
    pub service: TestService,
}

impl TestContext {
    /// A fresh context with the default 7-day TTL.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory backend fails, which it cannot.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), Arc::new(InMemoryRemoteCart::new()))
    }

    /// A context over existing collaborators, e.g. to simulate an app
    /// restart on the same persisted state.
    ///
    /// # Panics
    ///
    /// Panics if the backend cannot be read.
    #[must_use]
    pub fn with_store(backend: MemoryStore, server: Arc<InMemoryRemoteCart>) -> Self {
        init_tracing();
        let tokens = TokenHandle::new();
        #[allow(clippy::unwrap_used)]
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

    /// Rebuild the service over the same backend, server, and a fresh
    /// token slot - what a process restart looks like to the engine.
    #[must_use]
    pub fn restart(self) -> Self {
        Self::with_store(self.backend, self.server)
    }

    /// Install a bearer token, as the auth collaborator would on login.
    pub fn sign_in(&self) {
        self.tokens.set(SecretString::from("integration-test-token"));
    }

    /// Seed a purchasable product on the server and return its id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a valid product id.
    #[allow(clippy::unwrap_used)]
    pub fn seed(&self, id: &str, price: Decimal, stock: Option<u32>) -> ProductId {
        let product_id = ProductId::parse(id).unwrap();
        self.server.seed_product(&product_id, price, stock);
        product_id
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an add-time catalog snapshot.
#[must_use]
pub fn catalog_snapshot(id: &str, price: Decimal, stock: Option<u32>) -> ProductSnapshot {
    ProductSnapshot {
        product_id: id.to_string(),
        variation: Variation::default(),
        price,
        discount_price: None,
        stock,
    }
}

/// Install a test subscriber once for the whole test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
