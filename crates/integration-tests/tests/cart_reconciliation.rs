//! Integration tests for the anonymous-to-authenticated merge protocol.
//!
//! The server is the sole arbiter of how overlapping lines combine; these
//! tests pin down what the engine guarantees around that black box: no
//! client-side pre-merging, no data loss on failure, and a single source
//! of truth once authenticated.

use rust_decimal::dec;

use cartwheel_core::{CartMode, LineKey, ProductId, ProductSnapshot, Variation};
use cartwheel_engine::{CartError, RemoteCartApi, STORAGE_KEY, StorageBackend};
use cartwheel_integration_tests::{TestContext, catalog_snapshot};

// =============================================================================
// Merge Arithmetic
// =============================================================================

#[tokio::test]
async fn test_merge_overlapping_lines_last_write_wins() {
    let mut ctx = TestContext::new();
    let p1 = ctx.seed("p1", dec!(10), Some(10));

    // The account cart already holds 4 units from an earlier session
    ctx.server.add_item(&p1, 4).await.unwrap();

    // This device shops anonymously: 2 units
    ctx.service
        .add_item(&catalog_snapshot("p1", dec!(10), Some(10)), 2)
        .await
        .unwrap();

    ctx.sign_in();
    ctx.service.login().await.unwrap();

    // Last write wins: the synced quantity replaces the server's
    let totals = ctx.service.totals();
    assert_eq!(totals.count, 2);
    assert_eq!(totals.total, dec!(20));
}

#[tokio::test]
async fn test_merge_clamps_to_server_stock() {
    let mut ctx = TestContext::new();
    ctx.seed("p1", dec!(10), Some(3));

    // Locally the catalog reported plenty of stock
    ctx.service
        .add_item(&catalog_snapshot("p1", dec!(10), Some(100)), 9)
        .await
        .unwrap();

    ctx.sign_in();
    ctx.service.login().await.unwrap();

    assert_eq!(ctx.service.totals().count, 3);
}

#[tokio::test]
async fn test_merge_does_not_pre_combine_variation_lines() {
    let mut ctx = TestContext::new();
    ctx.seed("p1", dec!(10), Some(10));

    let plain = catalog_snapshot("p1", dec!(10), Some(10));
    let red = ProductSnapshot {
        variation: Variation {
            color: Some("red".to_string()),
            ..Variation::default()
        },
        ..plain.clone()
    };
    ctx.service.add_item(&plain, 1).await.unwrap();
    ctx.service.add_item(&red, 2).await.unwrap();
    assert_eq!(ctx.service.session().lines().len(), 2);

    ctx.sign_in();
    ctx.service.login().await.unwrap();

    // Both lines went up as separate {productId, quantity} entries; how
    // they combine is the server's call (here: last write wins)
    assert_eq!(ctx.service.totals().count, 2);
}

#[tokio::test]
async fn test_repeated_login_does_not_double_count() {
    let mut ctx = TestContext::new();
    ctx.seed("p1", dec!(10), Some(10));
    ctx.service
        .add_item(&catalog_snapshot("p1", dec!(10), Some(10)), 2)
        .await
        .unwrap();

    ctx.sign_in();
    ctx.service.login().await.unwrap();
    ctx.service.login().await.unwrap();

    assert_eq!(ctx.service.totals().count, 2);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[tokio::test]
async fn test_failed_merge_keeps_anonymous_cart_and_retries() {
    let mut ctx = TestContext::new();
    ctx.seed("p1", dec!(10), Some(10));
    ctx.service
        .add_item(&catalog_snapshot("p1", dec!(10), Some(10)), 2)
        .await
        .unwrap();

    ctx.sign_in();
    ctx.server.set_offline(true);

    let err = ctx.service.login().await.unwrap_err();
    assert!(matches!(err, CartError::Merge(_)));
    assert!(err.is_recoverable());
    assert_eq!(ctx.service.session().mode(), CartMode::Anonymous);
    assert_eq!(ctx.service.totals().count, 2);

    // The user keeps shopping locally while the account is unreachable
    let outcome = ctx
        .service
        .add_item(&catalog_snapshot("p1", dec!(10), Some(10)), 1)
        .await
        .unwrap();
    assert!(outcome.sync_pending);

    // Connectivity returns: the next refresh completes the merge
    ctx.server.set_offline(false);
    ctx.service.refresh().await.unwrap();
    assert_eq!(ctx.service.session().mode(), CartMode::Authenticated);
    assert_eq!(ctx.service.totals().count, 3);
}

#[tokio::test]
async fn test_authenticated_outage_never_forks_state() {
    let mut ctx = TestContext::new();
    ctx.seed("p1", dec!(10), Some(10));
    ctx.sign_in();
    ctx.service.login().await.unwrap();
    ctx.service
        .add_item(&catalog_snapshot("p1", dec!(10), Some(10)), 2)
        .await
        .unwrap();

    ctx.server.set_offline(true);
    let before = ctx.service.session().clone();
    let key = LineKey::resolve(&ProductId::parse("p1").unwrap(), &Variation::default());

    assert!(ctx.service.set_quantity(&key, 5).await.is_err());
    assert!(ctx.service.remove_item(&key).await.is_err());
    assert!(ctx.service.clear().await.is_err());

    // No partial mutation applied, and nothing leaked into local storage
    assert_eq!(ctx.service.session(), &before);
    assert!(ctx.backend.get(STORAGE_KEY).unwrap().is_none());
}
