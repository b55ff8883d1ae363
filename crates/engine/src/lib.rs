//! Cartwheel Engine - shopping-cart reconciliation.
//!
//! Keeps a user's cart consistent across two authoritative sources: a
//! locally-persisted, expiring anonymous cart and a server-backed
//! authenticated cart, merging the two at login under stock constraints
//! and unreliable network conditions.
//!
//! # Architecture
//!
//! - [`store`] - Anonymous cart persistence with a 7-day TTL over a
//!   key-value [`StorageBackend`]
//! - [`remote`] - Authenticated cart operations against the cart API,
//!   authenticated by bearer token
//! - [`service`] - The [`CartService`] orchestrator: mode selection,
//!   the anonymous-to-authenticated merge protocol, and remote-failure
//!   handling
//! - [`auth`] - Read-only bearer-token probe owned by the auth
//!   collaborator
//! - [`config`] - Environment-driven configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use cartwheel_engine::{CartService, FileStore, HttpCartClient, LocalCartStore, TokenHandle};
//!
//! let config = cartwheel_engine::CartEngineConfig::from_env()?;
//! let tokens = TokenHandle::new();
//! let store = LocalCartStore::with_ttl(FileStore::new(&config.store_dir), config.ttl);
//! let remote = HttpCartClient::new(&config.remote, tokens.clone())?;
//! let mut cart = CartService::new(store, remote, tokens)?;
//!
//! // Anonymous: mutations persist locally
//! cart.add_item(&snapshot, 2).await?;
//!
//! // Login: local lines merge into the account cart
//! cart.login().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod remote;
pub mod service;
pub mod store;

pub use auth::{TokenHandle, TokenProvider};
pub use config::{CartEngineConfig, ConfigError, RemoteCartConfig};
pub use error::CartError;
pub use remote::{
    CartSnapshot, HttpCartClient, InMemoryRemoteCart, MergePolicy, RemoteCartApi, RemoteError,
    RemoteLine, SyncEntry,
};
pub use service::{CartService, MutationOutcome, StockNotice};
pub use store::{FileStore, LocalCartStore, MemoryStore, STORAGE_KEY, StorageBackend, StoreError};
