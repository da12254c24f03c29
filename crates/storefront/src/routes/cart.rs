//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation renders the cart the backend returns; nothing is computed
//! locally. Cart IDs are stored in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use cornerstore_core::{LineItemId, ProductId};

use crate::commerce::{Cart, CommerceError, LineItem};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::models::session;
use crate::services::Sequenced;
use crate::services::checkout::CART_FETCH_ERROR;
use crate::state::AppState;

/// Shown when adding a product fails.
pub const ADD_TO_CART_ERROR: &str = "There was an issue adding the product to the cart";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub image_url: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    /// Set when the cart could not be loaded.
    pub error: Option<&'static str>,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: String::new(),
            item_count: 0,
            error: None,
        }
    }

    /// Placeholder for a cart the backend failed to return.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            error: Some(CART_FETCH_ERROR),
            ..Self::empty()
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.line_items.iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal.display(),
            item_count: cart.total_items,
            error: None,
        }
    }
}

impl From<&LineItem> for CartItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price.display(),
            image_url: item.image.as_ref().map(|image| image.url.clone()),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_item_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the session's cart, creating one when none is stored or the stored
/// one no longer exists. The resulting cart ID is saved back to the session.
pub(crate) async fn current_cart(
    state: &AppState,
    session: &Session,
) -> Result<Cart, CommerceError> {
    let stored = session::cart_id(session).await;
    let cart = state.commerce().retrieve_cart(stored.as_ref()).await?;

    if stored.as_ref() != Some(&cart.id)
        && let Err(e) = session::set_cart_id(session, &cart.id).await
    {
        tracing::error!(error = %e, "Failed to save cart ID to session");
    }

    Ok(cart)
}

/// Drop any checkout snapshot once the cart it was taken from changes.
async fn discard_checkout(session: &Session) {
    if let Err(e) = session::clear_pending_checkout(session).await {
        tracing::error!(error = %e, "Failed to clear checkout from session");
    }
}

/// Re-render the cart after a failed mutation.
async fn rerender_current(state: &AppState, session: &Session) -> Response {
    let cart = match current_cart(state, session).await {
        Ok(cart) => CartView::from(&cart),
        Err(e) => {
            tracing::error!(error = %e, "Error fetching cart");
            CartView::unavailable()
        }
    };
    CartItemsTemplate { cart }.into_response()
}

/// Cart items fragment plus a trigger so the badge refreshes.
fn updated_items(cart: &Cart) -> Response {
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(cart),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = match current_cart(&state, &session).await {
        Ok(cart) => CartView::from(&cart),
        Err(e) => {
            tracing::error!(error = %e, "Error fetching cart");
            CartView::unavailable()
        }
    };

    CartShowTemplate { cart }
}

/// Add item to cart (HTMX).
///
/// Returns the cart count badge with an HTMX trigger so other fragments
/// refresh. On failure the error is swapped into the flash area instead.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let quantity = form.quantity.unwrap_or(1).max(1);

    let result = match current_cart(&state, &session).await {
        Ok(cart) => {
            state
                .commerce()
                .add_to_cart(&cart.id, &product_id, quantity)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(cart) => {
            discard_checkout(&session).await;
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", product_id.as_str())]),
            );
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate {
                    count: cart.total_items,
                },
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, product_id = %product_id, "Error adding to cart");
            (
                AppendHeaders([("HX-Retarget", "#flash"), ("HX-Reswap", "innerHTML")]),
                Html(format!("<p class=\"alert alert-error\">{ADD_TO_CART_ERROR}</p>")),
            )
                .into_response()
        }
    }
}

/// Update cart item quantity (HTMX).
///
/// Updates for one line are applied in arrival order. A request overtaken by
/// a newer one for the same line answers `204 No Content`, which HTMX leaves
/// unswapped, so the page only ever shows the latest result.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let Some(cart_id) = session::cart_id(&session).await else {
        return rerender_current(&state, &session).await;
    };
    let line_item_id = LineItemId::new(form.line_item_id);

    let ticket = state.quantities().ticket(&cart_id, &line_item_id).await;
    let result = ticket
        .run(|| {
            state
                .commerce()
                .update_cart_item(&cart_id, &line_item_id, form.quantity)
        })
        .await;

    match result {
        Ok(Sequenced::Applied(cart)) => {
            discard_checkout(&session).await;
            updated_items(&cart)
        }
        Ok(Sequenced::Superseded) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(error = %e, line_item_id = %line_item_id, "Error updating cart");
            rerender_current(&state, &session).await
        }
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let Some(cart_id) = session::cart_id(&session).await else {
        return rerender_current(&state, &session).await;
    };
    let line_item_id = LineItemId::new(form.line_item_id);

    match state
        .commerce()
        .remove_cart_item(&cart_id, &line_item_id)
        .await
    {
        Ok(cart) => {
            discard_checkout(&session).await;
            updated_items(&cart)
        }
        Err(e) => {
            tracing::error!(error = %e, line_item_id = %line_item_id, "Error removing from cart");
            rerender_current(&state, &session).await
        }
    }
}

/// Remove every item from the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn empty(State(state): State<AppState>, session: Session) -> Response {
    let Some(cart_id) = session::cart_id(&session).await else {
        return rerender_current(&state, &session).await;
    };

    match state.commerce().empty_cart(&cart_id).await {
        Ok(cart) => {
            discard_checkout(&session).await;
            updated_items(&cart)
        }
        Err(e) => {
            tracing::error!(error = %e, "Error emptying cart");
            rerender_current(&state, &session).await
        }
    }
}

/// Get cart count badge (HTMX).
///
/// Visitors without a cart see zero; no cart is created for them. A stored
/// cart that has expired is replaced once and the new ID kept.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let count = if session::cart_id(&session).await.is_some() {
        current_cart(&state, &session)
            .await
            .map(|cart| cart.total_items)
            .unwrap_or(0)
    } else {
        0
    };

    CartCountTemplate { count }
}
