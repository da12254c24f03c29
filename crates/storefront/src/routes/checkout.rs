//! Checkout route handlers.
//!
//! `GET /checkout` loads the cart and generates a token; the snapshot is kept
//! in the session. `POST /checkout` validates the form and captures the
//! order, then redirects to the confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::Cart;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::models::session;
use crate::services::checkout::{self, CheckoutError, CheckoutForm, CheckoutStage};
use crate::state::AppState;

/// Read-only line shown in the item details section.
#[derive(Clone)]
pub struct CheckoutItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
}

impl CheckoutItemView {
    fn list(cart: &Cart) -> Vec<Self> {
        cart.line_items
            .iter()
            .map(|item| Self {
                name: item.name.clone(),
                quantity: item.quantity,
                price: item.price.display(),
            })
            .collect()
    }
}

/// Selectable region.
pub struct RegionOption {
    pub code: &'static str,
    pub name: &'static str,
}

/// Regions offered in the state select.
pub const REGIONS: &[RegionOption] = &[
    RegionOption {
        code: "CA",
        name: "California",
    },
    RegionOption {
        code: "TX",
        name: "Texas",
    },
    RegionOption {
        code: "NY",
        name: "New York",
    },
];

/// Countries offered in the country select.
pub const COUNTRIES: &[RegionOption] = &[
    RegionOption {
        code: "US",
        name: "United States",
    },
    RegionOption {
        code: "IN",
        name: "India",
    },
];

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub items: Vec<CheckoutItemView>,
    pub form: CheckoutForm,
    pub error: Option<String>,
    pub regions: &'static [RegionOption],
    pub countries: &'static [RegionOption],
}

impl CheckoutShowTemplate {
    fn new(cart: Option<&Cart>, form: CheckoutForm, error: Option<String>) -> Self {
        Self {
            items: cart.map(CheckoutItemView::list).unwrap_or_default(),
            form,
            error,
            regions: REGIONS,
            countries: COUNTRIES,
        }
    }
}

/// Empty cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/empty.html")]
pub struct CheckoutEmptyTemplate;

/// Checkout load failure page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/error.html")]
pub struct CheckoutErrorTemplate {
    pub message: &'static str,
}

/// Display checkout page.
///
/// # Errors
///
/// Returns `AppError::Session` if the checkout snapshot cannot be stored.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let cart_id = session::cart_id(&session).await;

    match checkout::begin(state.commerce(), cart_id.as_ref()).await {
        CheckoutStage::Failed(message) => {
            session::clear_pending_checkout(&session).await?;
            Ok(CheckoutErrorTemplate { message }.into_response())
        }
        CheckoutStage::EmptyCart => {
            session::clear_pending_checkout(&session).await?;
            Ok(CheckoutEmptyTemplate.into_response())
        }
        CheckoutStage::Ready(pending) => {
            session::set_pending_checkout(&session, &pending).await?;
            Ok(
                CheckoutShowTemplate::new(Some(&pending.cart), CheckoutForm::default(), None)
                    .into_response(),
            )
        }
    }
}

/// Place the order.
///
/// On success the session's cart and checkout are cleared and the shopper is
/// redirected to the confirmation page. On failure the form is re-rendered
/// with the entered values and an inline error.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let pending = session::pending_checkout(&session).await;
    let cart_id = session::cart_id(&session).await;

    match checkout::submit(
        state.commerce(),
        pending.as_ref(),
        cart_id.as_ref(),
        &form,
        &state.config().checkout,
    )
    .await
    {
        Ok(order) => {
            tracing::info!(order_id = %order.id, "Order captured");
            add_breadcrumb("checkout", "Order captured", Some(&[("order_id", order.id.as_str())]));

            if let Err(e) = session::clear_checkout(&session).await {
                tracing::error!(error = %e, "Failed to clear checkout from session");
            }

            let location = format!("/confirmation/{}", urlencoding::encode(order.id.as_str()));
            Redirect::to(&location).into_response()
        }
        Err(e) => {
            match &e {
                CheckoutError::MissingRegion => {}
                CheckoutError::TokenNotInitialized | CheckoutError::EmptyCart => {
                    tracing::error!(error = %e, "Checkout submitted without a usable snapshot");
                }
                CheckoutError::CartChanged => {
                    tracing::warn!("Checkout snapshot is stale, discarding it");
                    if let Err(e) = session::clear_pending_checkout(&session).await {
                        tracing::error!(error = %e, "Failed to clear checkout from session");
                    }
                }
                CheckoutError::Capture(source) => {
                    tracing::warn!(error = %source, "Checkout capture failed");
                }
            }

            // A stale snapshot's items are not what the shopper holds now
            let cart = if matches!(e, CheckoutError::CartChanged) {
                None
            } else {
                pending.as_ref().map(|p| &p.cart)
            };
            let message = e.user_message().to_string();
            CheckoutShowTemplate::new(cart, form, Some(message)).into_response()
        }
    }
}
