//! Session-stored shopping state.
//!
//! The session holds the shopper's cart ID and, while a checkout page is
//! open, the cart snapshot and token it was rendered with.

use tower_sessions::Session;

use cornerstore_core::CartId;

use crate::services::PendingCheckout;

/// Session keys for shopping state.
pub mod keys {
    /// Key for storing the backend cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the cart snapshot and token of the open checkout.
    pub const PENDING_CHECKOUT: &str = "pending_checkout";
}

/// Get the cart ID from the session.
///
/// A corrupt or unreadable entry is treated as no cart.
pub async fn cart_id(session: &Session) -> Option<CartId> {
    session
        .get::<CartId>(keys::CART_ID)
        .await
        .ok()
        .flatten()
        .filter(|id| !id.is_blank())
}

/// Set the cart ID in the session.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn set_cart_id(
    session: &Session,
    cart_id: &CartId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ID, cart_id).await
}

/// Get the checkout snapshot for the open checkout page.
pub async fn pending_checkout(session: &Session) -> Option<PendingCheckout> {
    session
        .get::<PendingCheckout>(keys::PENDING_CHECKOUT)
        .await
        .ok()
        .flatten()
}

/// Store the checkout snapshot for the open checkout page.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn set_pending_checkout(
    session: &Session,
    pending: &PendingCheckout,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::PENDING_CHECKOUT, pending).await
}

/// Forget the checkout snapshot, e.g. once the cart it was taken from
/// changes or checkout can no longer proceed.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn clear_pending_checkout(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<PendingCheckout>(keys::PENDING_CHECKOUT)
        .await?;
    Ok(())
}

/// Forget the cart and checkout after an order is captured.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn clear_checkout(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<PendingCheckout>(keys::PENDING_CHECKOUT).await?;
    session.remove::<CartId>(keys::CART_ID).await?;
    Ok(())
}
