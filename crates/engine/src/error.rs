//! Unified error handling for the cart engine.
//!
//! Identity errors are rejected at the mutation boundary before any I/O.
//! Remote, merge, and storage errors are recoverable: the engine leaves
//! already-held cart state intact and the caller may retry or keep
//! shopping. Corrupted local state never surfaces here at all - the store
//! resolves it silently (see [`crate::store`]).

use thiserror::Error;

use cartwheel_core::IdentityError;

use crate::remote::RemoteError;
use crate::store::StoreError;

/// Engine-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// Unusable product id; the mutation was rejected before any I/O and
    /// nothing was persisted.
    #[error("invalid product identity: {0}")]
    Identity(#[from] IdentityError),

    /// A remote cart operation failed in authenticated mode. State is
    /// unchanged; retry is safe.
    #[error("cart service unavailable: {0}")]
    Remote(#[source] RemoteError),

    /// The login-time merge failed. The anonymous cart is preserved and
    /// the merge retries on the next mutation or explicit refresh.
    #[error("could not sync your cart to your account: {0}")]
    Merge(#[source] RemoteError),

    /// The local persistence backend failed.
    #[error("local cart storage error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    /// Whether the caller can retry without losing cart state.
    ///
    /// Identity errors are caller bugs; everything else is surfaced as a
    /// recoverable, user-visible notification.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Identity(_))
    }
}

/// Result type alias for [`CartError`].
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CartError::Identity(IdentityError::Empty);
        assert_eq!(
            err.to_string(),
            "invalid product identity: product id cannot be empty"
        );

        let err = CartError::Merge(RemoteError::Unavailable("down".to_string()));
        assert_eq!(
            err.to_string(),
            "could not sync your cart to your account: cart service unavailable: down"
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(!CartError::Identity(IdentityError::Empty).is_recoverable());
        assert!(CartError::Remote(RemoteError::MissingToken).is_recoverable());
        assert!(CartError::Merge(RemoteError::RateLimited(5)).is_recoverable());
    }
}
