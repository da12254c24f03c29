//! Commerce backend REST client implementation.
//!
//! Uses `reqwest` 0.13 with JSON bodies. Catalog, cart and checkout calls use
//! the public key; order lookup uses the secret key and never leaves the
//! server.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use cornerstore_core::{
    ApiErrorBody, CartId, CheckoutTokenId, LineItemId, OrderId, Product, ProductId,
};

use crate::config::CommerceConfig;

use super::types::{
    AddToCartInput, CapturePayload, Cart, CartMutation, CheckoutToken, ListResponse, Order,
    UpdateLineInput,
};
use super::{CommerceApi, CommerceError};

/// Header carrying the API key.
const AUTH_HEADER: &str = "X-Authorization";

/// Which key a request is signed with.
#[derive(Debug, Clone, Copy)]
enum KeyKind {
    Public,
    Secret,
}

/// Client for the commerce backend REST API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    public_key: HeaderValue,
    secret_key: HeaderValue,
}

impl CommerceClient {
    /// Create a new commerce client.
    ///
    /// # Errors
    ///
    /// Returns an error if a key contains invalid header characters or the
    /// HTTP client fails to build.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let public_key = key_header(&config.public_key)?;
        let mut secret_key = key_header(config.secret_key.expose_secret())?;
        secret_key.set_sensitive(true);

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                public_key,
                secret_key,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn key(&self, kind: KeyKind) -> HeaderValue {
        match kind {
            KeyKind::Public => self.inner.public_key.clone(),
            KeyKind::Secret => self.inner.secret_key.clone(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, kind: KeyKind) -> Result<T, CommerceError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .header(AUTH_HEADER, self.key(kind))
            .send()
            .await?;
        handle_response(response).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, CommerceError> {
        let response = self
            .inner
            .client
            .request(method, self.url(path))
            .header(AUTH_HEADER, self.key(KeyKind::Public))
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, CommerceError> {
        let response = self
            .inner
            .client
            .delete(self.url(path))
            .header(AUTH_HEADER, self.key(KeyKind::Public))
            .send()
            .await?;
        handle_response(response).await
    }
}

#[async_trait]
impl CommerceApi for CommerceClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        let response: ListResponse<Product> = self.get("/products", KeyKind::Public).await?;
        Ok(response.data)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn retrieve_product(&self, product_id: &ProductId) -> Result<Product, CommerceError> {
        self.get(&format!("/products/{}", segment(product_id.as_str())), KeyKind::Public)
            .await
    }

    #[instrument(skip(self))]
    async fn retrieve_cart(&self, cart_id: Option<&CartId>) -> Result<Cart, CommerceError> {
        let Some(cart_id) = cart_id else {
            return self.get("/carts", KeyKind::Public).await;
        };

        match self
            .get(&format!("/carts/{}", segment(cart_id.as_str())), KeyKind::Public)
            .await
        {
            // Expired or foreign cart: start a fresh one
            Err(e) if e.is_not_found() => {
                tracing::debug!(cart_id = %cart_id, "Cart not found, creating a new one");
                self.get("/carts", KeyKind::Public).await
            }
            other => other,
        }
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    async fn add_to_cart(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let body = AddToCartInput {
            id: product_id,
            quantity,
        };
        let mutation: CartMutation = self
            .send_json(
                reqwest::Method::POST,
                &format!("/carts/{}", segment(cart_id.as_str())),
                &body,
            )
            .await?;
        Ok(mutation.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_item_id = %line_item_id))]
    async fn update_cart_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let mutation: CartMutation = self
            .send_json(
                reqwest::Method::PUT,
                &format!(
                    "/carts/{}/items/{}",
                    segment(cart_id.as_str()),
                    segment(line_item_id.as_str())
                ),
                &UpdateLineInput { quantity },
            )
            .await?;
        Ok(mutation.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_item_id = %line_item_id))]
    async fn remove_cart_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
    ) -> Result<Cart, CommerceError> {
        let mutation: CartMutation = self
            .delete(&format!(
                "/carts/{}/items/{}",
                segment(cart_id.as_str()),
                segment(line_item_id.as_str())
            ))
            .await?;
        Ok(mutation.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn empty_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let mutation: CartMutation = self
            .delete(&format!("/carts/{}/items", segment(cart_id.as_str())))
            .await?;
        Ok(mutation.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn generate_token(&self, cart_id: &CartId) -> Result<CheckoutToken, CommerceError> {
        self.get(
            &format!("/checkouts/{}?type=cart", segment(cart_id.as_str())),
            KeyKind::Public,
        )
        .await
    }

    #[instrument(skip(self, payload), fields(token_id = %token_id))]
    async fn capture_checkout(
        &self,
        token_id: &CheckoutTokenId,
        payload: &CapturePayload,
    ) -> Result<Order, CommerceError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/checkouts/{}", segment(token_id.as_str())),
            payload,
        )
        .await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn retrieve_order(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.get(&format!("/orders/{}", segment(order_id.as_str())), KeyKind::Secret)
            .await
    }
}

/// Build an API key header value.
fn key_header(key: &str) -> Result<HeaderValue, CommerceError> {
    HeaderValue::from_str(key).map_err(|e| CommerceError::Unauthorized(format!("invalid API key: {e}")))
}

/// Percent-encode an ID for use as a path segment.
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Turn a backend response into a typed value or a `CommerceError`.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CommerceError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(CommerceError::RateLimited(retry_after));
    }

    // Read the body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        return Err(error_from_body(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse commerce backend response"
        );
        CommerceError::Parse(e)
    })
}

/// Map a non-success status and its body onto a `CommerceError`.
fn error_from_body(status: reqwest::StatusCode, body: &str) -> CommerceError {
    let parsed = ApiErrorBody::parse(body);
    let message = parsed.message().map(str::to_string);

    match status {
        reqwest::StatusCode::NOT_FOUND => {
            CommerceError::NotFound(message.unwrap_or_else(|| "resource not found".to_string()))
        }
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            CommerceError::Unauthorized(message.unwrap_or_else(|| "API key rejected".to_string()))
        }
        _ => {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Commerce backend returned non-success status"
            );
            CommerceError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}
