//! Order confirmation route handlers.
//!
//! The order ID travels in the URL, so the page survives a reload and the
//! reference shown always comes from the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use cornerstore_core::OrderId;

use crate::filters;
use crate::state::AppState;

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "confirmation/show.html")]
pub struct ConfirmationTemplate {
    pub customer_reference: String,
}

/// Missing order page template.
#[derive(Template, WebTemplate)]
#[template(path = "confirmation/missing.html")]
pub struct NoOrderTemplate;

/// Confirmation without an order ID.
pub async fn missing() -> Response {
    (StatusCode::NOT_FOUND, NoOrderTemplate).into_response()
}

/// Display the confirmation for a captured order.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(order_id): Path<String>) -> Response {
    let order_id = OrderId::new(order_id);
    if order_id.is_blank() {
        return missing().await;
    }

    match state.commerce().retrieve_order(&order_id).await {
        Ok(order) => ConfirmationTemplate {
            customer_reference: order.customer_reference,
        }
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, order_id = %order_id, "Error fetching order");
            missing().await
        }
    }
}
