//! Bearer-token probe.
//!
//! Token issuance and refresh belong to the authentication collaborator;
//! this engine only asks "is there a bearer token right now" and reads the
//! current value when making remote calls. The token is ambient read-only
//! state shared between the [`CartService`](crate::service::CartService)
//! (mode selection) and the remote client (the `Authorization` header).

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;

/// Read-only view of the current bearer token.
pub trait TokenProvider {
    /// The current bearer token, if a user is authenticated.
    fn bearer_token(&self) -> Option<SecretString>;

    /// Whether a bearer token is currently present.
    fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}

impl<T: TokenProvider + ?Sized> TokenProvider for Arc<T> {
    fn bearer_token(&self) -> Option<SecretString> {
        (**self).bearer_token()
    }
}

/// Shared token slot for embedders and tests.
///
/// The auth collaborator writes the token on login/logout; clones of the
/// handle observe the change immediately.
#[derive(Clone, Default)]
pub struct TokenHandle {
    inner: Arc<RwLock<Option<SecretString>>>,
}

impl TokenHandle {
    /// Create an empty handle (no token present).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a bearer token.
    pub fn set(&self, token: SecretString) {
        *self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Drop the current token.
    pub fn clear(&self) {
        *self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl TokenProvider for TokenHandle {
    fn bearer_token(&self) -> Option<SecretString> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for TokenHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHandle")
            .field("present", &self.is_authenticated())
            .finish()
    }
}
