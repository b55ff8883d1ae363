//! Remote cart API client.
//!
//! The server cart is the single source of truth in authenticated mode.
//! Every operation requires a bearer token and, on success, returns the
//! full authoritative cart snapshot - never a delta - so the engine can
//! replace its in-memory state wholesale (server-side stock and price may
//! differ from the client's optimistic guess).
//!
//! # Implementations
//!
//! - [`HttpCartClient`] - production REST client over `reqwest`
//! - [`InMemoryRemoteCart`] - in-process reference implementation used by
//!   tests, with failure injection and a configurable [`MergePolicy`]

mod http;
mod memory;

pub use http::HttpCartClient;
pub use memory::InMemoryRemoteCart;

use std::future::Future;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cartwheel_core::{LineKey, ProductId, Variation};

/// Errors that can occur when talking to the cart API.
///
/// All variants are recoverable from the session's point of view: the
/// engine leaves its state unchanged and the caller may retry.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API returned a non-success status.
    #[error("cart API returned HTTP {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },

    /// Rate limited by the cart API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// No bearer token is available for an authenticated call.
    #[error("no bearer token available")]
    MissingToken,

    /// The cart service is unreachable.
    #[error("cart service unavailable: {0}")]
    Unavailable(String),
}

/// One line of the authoritative server cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLine {
    /// Product identifier as the server knows it.
    pub product_id: String,
    /// Variation attributes, when the server tracks them.
    #[serde(default)]
    pub variation: Variation,
    /// Authoritative quantity.
    pub quantity: u32,
    /// Authoritative unit price.
    pub unit_price: Decimal,
    /// Server-side stock, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

/// Full cart snapshot returned by every successful API call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// All lines of the server cart.
    pub items: Vec<RemoteLine>,
}

/// One entry of the login-time bulk merge request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncEntry {
    /// Product identifier.
    pub product_id: ProductId,
    /// Locally-held quantity.
    pub quantity: u32,
}

/// How the server combines an incoming sync quantity with a quantity it
/// already holds for the same product.
///
/// The production contract is last-write-wins with stock clamping, which
/// [`Replace`](Self::Replace) models; it is what makes `sync_cart`
/// idempotent. [`Sum`](Self::Sum) models servers that accumulate instead
/// and is not idempotent - repeating a sync double-counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// The incoming quantity wins, clamped to server stock.
    #[default]
    Replace,
    /// The larger of the two quantities wins, clamped to server stock.
    Max,
    /// Quantities add, clamped to server stock.
    Sum,
}

impl MergePolicy {
    /// Combine an existing server quantity with an incoming sync quantity.
    #[must_use]
    pub const fn combine(self, existing: u32, incoming: u32) -> u32 {
        match self {
            Self::Replace => incoming,
            Self::Max => {
                if existing > incoming {
                    existing
                } else {
                    incoming
                }
            }
            Self::Sum => existing.saturating_add(incoming),
        }
    }
}

/// Contract to the authoritative server cart.
///
/// All operations require a bearer token and may fail with
/// [`RemoteError`]; each success returns the full authoritative
/// [`CartSnapshot`].
pub trait RemoteCartApi: Send + Sync {
    /// Fetch the current server cart.
    fn get_cart(&self) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send;

    /// Add `quantity` units of a product to the server cart.
    fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send;

    /// Remove a line from the server cart.
    fn remove_item(
        &self,
        key: &LineKey,
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send;

    /// Set the quantity of a line. A quantity of zero or less is
    /// equivalent to [`remove_item`](Self::remove_item).
    fn set_quantity(
        &self,
        key: &LineKey,
        quantity: i64,
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send;

    /// Empty the server cart.
    fn clear(&self) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send;

    /// Bulk-merge locally-held lines into the server cart. Used only
    /// during the login transition; idempotent under the production merge
    /// contract.
    fn sync_cart(
        &self,
        entries: &[SyncEntry],
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send;
}

impl<R: RemoteCartApi> RemoteCartApi for std::sync::Arc<R> {
    fn get_cart(&self) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send {
        (**self).get_cart()
    }

    fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send {
        (**self).add_item(product_id, quantity)
    }

    fn remove_item(
        &self,
        key: &LineKey,
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send {
        (**self).remove_item(key)
    }

    fn set_quantity(
        &self,
        key: &LineKey,
        quantity: i64,
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send {
        (**self).set_quantity(key, quantity)
    }

    fn clear(&self) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send {
        (**self).clear()
    }

    fn sync_cart(
        &self,
        entries: &[SyncEntry],
    ) -> impl Future<Output = Result<CartSnapshot, RemoteError>> + Send {
        (**self).sync_cart(entries)
    }
}
