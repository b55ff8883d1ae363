//! REST client for the cart API.
//!
//! Request bodies carry `{productId, quantity}`; every response is a full
//! `{items: [...]}` cart snapshot. Authentication is a bearer token read
//! from the shared [`TokenProvider`] at call time.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;

use cartwheel_core::{LineKey, ProductId};

use crate::auth::TokenProvider;
use crate::config::RemoteCartConfig;

use super::{CartSnapshot, RemoteCartApi, RemoteError, SyncEntry};

/// How much response body to keep in error diagnostics.
const BODY_SNIPPET_LEN: usize = 500;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SetQuantityBody {
    quantity: i64,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncBody<'a> {
    items: &'a [SyncEntry],
}

/// Client for the remote cart API.
///
/// Cheap to clone; the HTTP connection pool and configuration are shared.
pub struct HttpCartClient<T> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    client: reqwest::Client,
    base_url: Url,
    tokens: T,
}

impl<T> Clone for HttpCartClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TokenProvider> HttpCartClient<T> {
    /// Create a new cart API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &RemoteCartConfig, tokens: T) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                client,
                base_url: config.base_url.clone(),
                tokens,
            }),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Unavailable("cart API base URL cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request with bearer auth and decode the cart snapshot.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<CartSnapshot, RemoteError> {
        let token = self
            .inner
            .tokens
            .bearer_token()
            .ok_or(RemoteError::MissingToken)?;

        let response = request.bearer_auth(token.expose_secret()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(RemoteError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let message: String = response_text.chars().take(BODY_SNIPPET_LEN).collect();
            tracing::error!(
                status = %status,
                body = %message,
                "cart API returned non-success status"
            );
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(BODY_SNIPPET_LEN).collect::<String>(),
                "failed to parse cart API response"
            );
            RemoteError::Parse(e)
        })
    }
}

impl<T: TokenProvider + Send + Sync> RemoteCartApi for HttpCartClient<T> {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<CartSnapshot, RemoteError> {
        let url = self.url(&["cart"])?;
        self.execute(self.inner.client.get(url)).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, RemoteError> {
        let url = self.url(&["cart", "items"])?;
        let body = AddItemBody {
            product_id,
            quantity,
        };
        self.execute(self.inner.client.post(url).json(&body)).await
    }

    #[instrument(skip(self), fields(line_key = %key))]
    async fn remove_item(&self, key: &LineKey) -> Result<CartSnapshot, RemoteError> {
        let url = self.url(&["cart", "items", key.as_str()])?;
        self.execute(self.inner.client.delete(url)).await
    }

    #[instrument(skip(self), fields(line_key = %key))]
    async fn set_quantity(&self, key: &LineKey, quantity: i64) -> Result<CartSnapshot, RemoteError> {
        let url = self.url(&["cart", "items", key.as_str()])?;
        let body = SetQuantityBody { quantity };
        self.execute(self.inner.client.put(url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<CartSnapshot, RemoteError> {
        let url = self.url(&["cart"])?;
        self.execute(self.inner.client.delete(url)).await
    }

    #[instrument(skip(self, entries), fields(entry_count = entries.len()))]
    async fn sync_cart(&self, entries: &[SyncEntry]) -> Result<CartSnapshot, RemoteError> {
        let url = self.url(&["cart", "sync"])?;
        let body = SyncBody { items: entries };
        self.execute(self.inner.client.post(url).json(&body)).await
    }
}
