//! Commerce backend API access.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products, carts, checkout tokens
//!   and orders - NO local sync, NO caching, direct API calls
//! - Handlers depend on the [`CommerceApi`] trait; `main` constructs one
//!   [`CommerceClient`] and injects it through `AppState`
//! - Every call returns the backend's structured response or a
//!   [`CommerceError`] carrying the backend's optional nested message
//!
//! # Example
//!
//! ```rust,ignore
//! use cornerstore_storefront::commerce::{CommerceApi, CommerceClient};
//!
//! let client = CommerceClient::new(&config.commerce)?;
//!
//! let cart = client.retrieve_cart(None).await?;
//! let cart = client.add_to_cart(&cart.id, &product.id, 1).await?;
//! let token = client.generate_token(&cart.id).await?;
//! ```

mod client;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use client::CommerceClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use cornerstore_core::{CartId, CheckoutTokenId, LineItemId, OrderId, Product, ProductId};

/// Errors that can occur when interacting with the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Nested `error.message` from the response body, if any.
        message: Option<String>,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API key missing or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CommerceError {
    /// The backend's nested error message, if the failure carried one.
    ///
    /// This is the text shown to shoppers when a capture fails.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            Self::NotFound(message) | Self::Unauthorized(message) if !message.is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Whether the backend reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Operations the storefront performs against the commerce backend.
///
/// Each method is one remote call. Cart mutations return the backend's
/// updated cart, which callers render as-is.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// List the product collection.
    async fn list_products(&self) -> Result<Vec<Product>, CommerceError>;

    /// Retrieve a single product.
    async fn retrieve_product(&self, product_id: &ProductId) -> Result<Product, CommerceError>;

    /// Retrieve a cart, or create a new one when `cart_id` is `None`.
    async fn retrieve_cart(&self, cart_id: Option<&CartId>) -> Result<Cart, CommerceError>;

    /// Add a product to a cart.
    async fn add_to_cart(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CommerceError>;

    /// Set the quantity of a line item.
    async fn update_cart_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, CommerceError>;

    /// Remove a line item.
    async fn remove_cart_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
    ) -> Result<Cart, CommerceError>;

    /// Remove every line item.
    async fn empty_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError>;

    /// Generate a checkout token scoped to a cart (type `cart`).
    async fn generate_token(&self, cart_id: &CartId) -> Result<CheckoutToken, CommerceError>;

    /// Capture an order against a checkout token.
    async fn capture_checkout(
        &self,
        token_id: &CheckoutTokenId,
        payload: &CapturePayload,
    ) -> Result<Order, CommerceError>;

    /// Retrieve a captured order.
    async fn retrieve_order(&self, order_id: &OrderId) -> Result<Order, CommerceError>;
}
