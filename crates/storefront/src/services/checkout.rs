//! Checkout orchestration.
//!
//! A checkout page visit moves through these stages:
//!
//! ```text
//! Initializing --cart fetch fails--------------> Failed
//!      |       --cart has no items-------------> EmptyCart
//!      |       --token generation fails--------> Failed
//!      v
//!    Ready --region missing / token malformed--> Ready (inline error, no capture)
//!      |   --capture fails---------------------> Ready (backend message)
//!      v
//!  Completed (order id handed to the confirmation page)
//! ```
//!
//! The cart snapshot and checkout token from `Initializing` are kept in the
//! session as a [`PendingCheckout`] so a submit captures exactly the lines the
//! shopper saw.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use cornerstore_core::CartId;

use crate::commerce::{
    CaptureAddress, CaptureCard, CaptureCustomer, CaptureFulfillment, CapturePayload,
    CapturePayment, Cart, CheckoutToken, CommerceApi, CommerceError, LineItemQuantity, Order,
};
use crate::config::CheckoutSettings;

/// Shown when the cart or token cannot be loaded.
pub const CART_FETCH_ERROR: &str = "Error fetching cart. Please try again later.";

/// Shown when the shopper submits without choosing a state.
pub const MISSING_REGION_ERROR: &str = "Please select a state.";

/// Shown when a submit fails without a backend-supplied message.
pub const GENERIC_CHECKOUT_ERROR: &str = "An error occurred during checkout";

/// Default country preselected on the form.
pub const DEFAULT_COUNTRY: &str = "US";

/// Cart snapshot and token for one checkout page visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckout {
    pub cart: Cart,
    pub token: CheckoutToken,
}

/// Outcome of loading the checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStage {
    /// Cart or token could not be loaded; the message is user-facing.
    Failed(&'static str),
    /// Nothing to check out; no token was requested.
    EmptyCart,
    /// Token generated; the form can be submitted.
    Ready(PendingCheckout),
}

/// Checkout form fields as posted by the browser.
///
/// Shipping and payment fields are independent text inputs; the only
/// validation applied is that a state has been selected.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub email: String,
    /// Region (county/state/province) code, e.g. `CA`.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_month: String,
    #[serde(default)]
    pub expiry_year: String,
    #[serde(default)]
    pub cvc: String,
    #[serde(default)]
    pub postal_zip_code: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            state: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            city: String::new(),
            zip: String::new(),
            country: default_country(),
            card_number: String::new(),
            expiry_month: String::new(),
            expiry_year: String::new(),
            cvc: String::new(),
            postal_zip_code: String::new(),
        }
    }
}

impl std::fmt::Debug for CheckoutForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutForm")
            .field("email", &self.email)
            .field("state", &self.state)
            .field("country", &self.country)
            .field("card_number", &"[REDACTED]")
            .field("cvc", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl CheckoutForm {
    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn address_block(&self) -> CaptureAddress {
        CaptureAddress {
            name: self.full_name(),
            street: self.address.clone(),
            town_city: self.city.clone(),
            county_state: self.state.clone(),
            postal_zip_code: self.zip.clone(),
            country: self.country.clone(),
        }
    }
}

/// Reasons a checkout submit did not produce an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No state selected; nothing was sent to the backend.
    #[error("{MISSING_REGION_ERROR}")]
    MissingRegion,

    /// No usable token for this visit; nothing was sent to the backend.
    #[error("Checkout token is not properly initialized")]
    TokenNotInitialized,

    /// The cart snapshot has no items; nothing was sent to the backend.
    #[error("Cart is empty")]
    EmptyCart,

    /// The snapshot belongs to a cart the session no longer holds; nothing
    /// was sent to the backend.
    #[error("Checkout snapshot does not match the current cart")]
    CartChanged,

    /// The backend rejected the capture.
    #[error("Capture failed: {0}")]
    Capture(#[source] CommerceError),
}

impl CheckoutError {
    /// Message to show inline on the checkout form.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::MissingRegion => MISSING_REGION_ERROR,
            Self::Capture(err) => err.api_message().unwrap_or(GENERIC_CHECKOUT_ERROR),
            Self::TokenNotInitialized | Self::EmptyCart | Self::CartChanged => {
                GENERIC_CHECKOUT_ERROR
            }
        }
    }
}

/// Load the cart and generate a checkout token for it.
///
/// A visitor without a cart has nothing to check out, so no backend call is
/// made for them.
#[instrument(skip(api))]
pub async fn begin(api: &dyn CommerceApi, cart_id: Option<&CartId>) -> CheckoutStage {
    let Some(cart_id) = cart_id else {
        return CheckoutStage::EmptyCart;
    };

    let cart = match api.retrieve_cart(Some(cart_id)).await {
        Ok(cart) => cart,
        Err(e) => {
            tracing::error!(error = %e, "Error fetching cart for checkout");
            return CheckoutStage::Failed(CART_FETCH_ERROR);
        }
    };

    if cart.is_empty() {
        return CheckoutStage::EmptyCart;
    }

    match api.generate_token(&cart.id).await {
        Ok(token) => CheckoutStage::Ready(PendingCheckout { cart, token }),
        Err(e) => {
            tracing::error!(error = %e, cart_id = %cart.id, "Error generating checkout token");
            CheckoutStage::Failed(CART_FETCH_ERROR)
        }
    }
}

/// Assemble the capture request from the cart snapshot and form fields.
///
/// Shipping and billing addresses are identical; both come from the
/// shipping fields.
#[must_use]
pub fn build_capture_payload(
    cart: &Cart,
    form: &CheckoutForm,
    settings: &CheckoutSettings,
) -> CapturePayload {
    let line_items: BTreeMap<_, _> = cart
        .line_items
        .iter()
        .map(|item| {
            (
                item.id.clone(),
                LineItemQuantity {
                    quantity: item.quantity,
                },
            )
        })
        .collect();

    CapturePayload {
        line_items,
        customer: CaptureCustomer {
            firstname: form.first_name.clone(),
            lastname: form.last_name.clone(),
            county_state: form.state.clone(),
            email: form.email.clone(),
        },
        shipping: form.address_block(),
        fulfillment: CaptureFulfillment {
            shipping_method: settings.shipping_method.clone(),
        },
        billing: form.address_block(),
        payment: CapturePayment {
            gateway: settings.payment_gateway.clone(),
            card: CaptureCard {
                number: form.card_number.clone(),
                expiry_month: form.expiry_month.clone(),
                expiry_year: form.expiry_year.clone(),
                cvc: form.cvc.clone(),
                postal_zip_code: form.postal_zip_code.clone(),
            },
        },
    }
}

/// Validate the form and capture an order for the pending checkout.
///
/// No idempotency key is attached: submitting again after a failure issues a
/// fresh capture against the same token.
///
/// # Errors
///
/// Returns `CheckoutError` without calling the backend when the state is
/// missing, the snapshot is absent, empty or not for `cart_id`, or the token
/// is unusable, and `CheckoutError::Capture` when the backend rejects the
/// capture.
#[instrument(skip(api, pending, settings))]
pub async fn submit(
    api: &dyn CommerceApi,
    pending: Option<&PendingCheckout>,
    cart_id: Option<&CartId>,
    form: &CheckoutForm,
    settings: &CheckoutSettings,
) -> Result<Order, CheckoutError> {
    if form.state.trim().is_empty() {
        return Err(CheckoutError::MissingRegion);
    }

    let Some(pending) = pending else {
        return Err(CheckoutError::TokenNotInitialized);
    };

    if cart_id != Some(&pending.cart.id) {
        return Err(CheckoutError::CartChanged);
    }

    if pending.cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let Some(token_id) = pending.token.usable_id() else {
        return Err(CheckoutError::TokenNotInitialized);
    };

    let payload = build_capture_payload(&pending.cart, form, settings);

    api.capture_checkout(token_id, &payload)
        .await
        .map_err(CheckoutError::Capture)
}
