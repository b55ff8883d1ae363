//! Cartwheel Core - Shared cart types library.
//!
//! This crate provides the cart domain types used across all Cartwheel
//! components:
//! - `engine` - Cart reconciliation engine (local store, remote client)
//! - `integration-tests` - Cross-crate scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no
//! storage access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Line identity, cart lines and sessions, stock clamping,
//!   and cart totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
