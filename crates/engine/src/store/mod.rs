//! Anonymous cart persistence.
//!
//! The anonymous cart survives restarts through a plain key-value string
//! store (the browser-local-storage shape: no native TTL). Expiry is
//! implemented by embedding `expiresAt` in the serialized payload; a
//! session older than the TTL is discarded wholesale on load, never
//! partially.
//!
//! Corrupted persisted state must never block cart usage: a payload that
//! fails to parse is logged, deleted, and treated as an empty session.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use cartwheel_core::CartLine;

/// Key under which the anonymous cart is persisted.
pub const STORAGE_KEY: &str = "cart.session";

/// Default lifetime of a persisted anonymous cart.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backend failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the cart payload failed.
    #[error("failed to encode cart payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Synchronous string key-value storage.
///
/// Stands in for browser local storage: get/put/remove on string keys,
/// no native TTL. Implementations must be safe to call from the single
/// mutation path (no concurrent writers are modeled).
pub trait StorageBackend {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the value stored under `key`. Deleting a missing key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Serialized shape of the persisted anonymous cart.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCart {
    lines: Vec<CartLine>,
    expires_at: DateTime<Utc>,
}

/// TTL-bound persistence of the anonymous cart over a [`StorageBackend`].
///
/// Every successful [`save`](Self::save) stamps a fresh expiry of
/// now + TTL. Saving an empty line set clears the entry instead, so an
/// empty cart never extends a TTL on nothing.
#[derive(Debug, Clone)]
pub struct LocalCartStore<S> {
    backend: S,
    ttl: Duration,
}

impl<S: StorageBackend> LocalCartStore<S> {
    /// Create a store with the default 7-day TTL.
    pub fn new(backend: S) -> Self {
        Self::with_ttl(backend, Duration::days(DEFAULT_TTL_DAYS))
    }

    /// Create a store with an explicit TTL.
    pub const fn with_ttl(backend: S, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Load the persisted cart lines.
    ///
    /// An expired or malformed payload is discarded and reported as an
    /// empty cart; corruption is never raised to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend itself cannot be read.
    pub fn load(&self) -> Result<Vec<CartLine>, StoreError> {
        self.load_at(Utc::now())
    }

    pub(crate) fn load_at(&self, now: DateTime<Utc>) -> Result<Vec<CartLine>, StoreError> {
        let Some(raw) = self.backend.get(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };

        let stored: StoredCart = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(%error, "discarding corrupted local cart");
                self.discard();
                return Ok(Vec::new());
            }
        };

        if stored.expires_at <= now {
            self.discard();
            return Ok(Vec::new());
        }

        Ok(stored.lines)
    }

    /// Persist the given lines with a fresh expiry.
    ///
    /// An empty line set clears the entry instead of writing an empty
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub fn save(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        self.save_at(lines, Utc::now())
    }

    pub(crate) fn save_at(&self, lines: &[CartLine], now: DateTime<Utc>) -> Result<(), StoreError> {
        if lines.is_empty() {
            return self.clear();
        }
        let stored = StoredCart {
            lines: lines.to_vec(),
            expires_at: now + self.ttl,
        };
        let payload = serde_json::to_string(&stored)?;
        self.backend.put(STORAGE_KEY, &payload)
    }

    /// Delete the persisted cart entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(STORAGE_KEY)
    }

    /// Best-effort removal of an unusable payload.
    fn discard(&self) {
        if let Err(error) = self.backend.remove(STORAGE_KEY) {
            warn!(%error, "failed to remove unusable local cart entry");
        }
    }
}
