//! Domain types for the commerce backend's cart, checkout and order APIs.
//!
//! Field names follow the backend's JSON so the types deserialize directly
//! from responses. Catalog types shared with the admin proxy live in
//! `cornerstore_core`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cornerstore_core::{CartId, CheckoutTokenId, Image, LineItemId, OrderId, Price, ProductId};

// =============================================================================
// Cart Types
// =============================================================================

/// A server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    /// Sum of all line item quantities.
    #[serde(default)]
    pub total_items: u32,
    /// Number of distinct line items.
    #[serde(default)]
    pub total_unique_items: u32,
    /// Backend-computed subtotal.
    pub subtotal: Price,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Cart {
    /// Whether the cart holds nothing to check out.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

/// One product entry within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price.
    pub price: Price,
    /// Unit price times quantity.
    #[serde(default)]
    pub line_total: Option<Price>,
    #[serde(default)]
    pub image: Option<Image>,
}

/// Envelope returned by cart mutations (add, update, remove, empty).
#[derive(Debug, Clone, Deserialize)]
pub struct CartMutation {
    #[serde(default)]
    pub success: Option<bool>,
    pub cart: Cart,
}

/// Body for adding a product to a cart.
#[derive(Debug, Clone, Serialize)]
pub struct AddToCartInput<'a> {
    /// Product ID (the backend calls it `id`).
    pub id: &'a ProductId,
    pub quantity: u32,
}

/// Body for updating a line item.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateLineInput {
    pub quantity: u32,
}

// =============================================================================
// Catalog Envelopes
// =============================================================================

/// Envelope returned by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

// =============================================================================
// Checkout Types
// =============================================================================

/// A checkout token binding a cart snapshot to one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutToken {
    /// Token ID. A token without one is malformed and cannot be captured.
    #[serde(default)]
    pub id: Option<CheckoutTokenId>,
    /// Cart the token was generated for.
    #[serde(default)]
    pub cart_id: Option<CartId>,
}

impl CheckoutToken {
    /// The token ID, if present and non-blank.
    #[must_use]
    pub fn usable_id(&self) -> Option<&CheckoutTokenId> {
        self.id.as_ref().filter(|id| !id.is_blank())
    }
}

/// Quantity entry in the capture payload's line item map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemQuantity {
    pub quantity: u32,
}

/// Customer block of the capture payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureCustomer {
    pub firstname: String,
    pub lastname: String,
    pub county_state: String,
    pub email: String,
}

/// Shipping or billing address block of the capture payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureAddress {
    pub name: String,
    pub street: String,
    pub town_city: String,
    pub county_state: String,
    pub postal_zip_code: String,
    pub country: String,
}

/// Fulfillment block of the capture payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFulfillment {
    pub shipping_method: String,
}

/// Raw card fields forwarded to the payment gateway.
///
/// Implements `Debug` manually so card data never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureCard {
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvc: String,
    pub postal_zip_code: String,
}

impl std::fmt::Debug for CaptureCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCard")
            .field("number", &"[REDACTED]")
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvc", &"[REDACTED]")
            .field("postal_zip_code", &self.postal_zip_code)
            .finish()
    }
}

/// Payment block of the capture payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePayment {
    pub gateway: String,
    pub card: CaptureCard,
}

/// Order capture request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePayload {
    /// Line item ID to quantity, one entry per line in the cart.
    pub line_items: BTreeMap<LineItemId, LineItemQuantity>,
    pub customer: CaptureCustomer,
    pub shipping: CaptureAddress,
    pub fulfillment: CaptureFulfillment,
    pub billing: CaptureAddress,
    pub payment: CapturePayment,
}

// =============================================================================
// Order Types
// =============================================================================

/// Customer details echoed on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// A captured order. Opaque apart from the fields the confirmation page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing order reference.
    pub customer_reference: String,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
    #[serde(default)]
    pub order_value: Option<Price>,
}
