//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `checkout` - Token generation, form validation and order capture
//! - `cart_sync` - Ordering of concurrent line item quantity updates

pub mod cart_sync;
pub mod checkout;

pub use cart_sync::{QuantitySequencer, Sequenced};
pub use checkout::{CheckoutError, CheckoutForm, CheckoutStage, PendingCheckout};
