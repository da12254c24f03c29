//! Product route handlers.

use std::sync::LazyLock;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::instrument;

use cornerstore_core::{Product, ProductId};

use crate::filters;
use crate::state::AppState;

/// Shown in place of a missing product image.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x300";

/// Matches HTML tags in backend-authored descriptions.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    /// Description with markup removed; escaped on render.
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub categories: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: strip_tags(&product.description),
            price: product.price.display(),
            image_url: product
                .image
                .as_ref()
                .map_or_else(|| PLACEHOLDER_IMAGE.to_string(), |image| image.url.clone()),
            categories: product.category_names(),
        }
    }
}

/// Remove HTML tags, leaving the text content.
fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Product not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate;

/// Display product listing page.
///
/// A backend failure renders an empty listing.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let products = match state.commerce().list_products().await {
        Ok(products) => products.iter().map(ProductView::from).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Error fetching products");
            Vec::new()
        }
    };

    ProductsIndexTemplate { products }
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(product_id): Path<String>) -> Response {
    let product_id = ProductId::new(product_id);

    match state.commerce().retrieve_product(&product_id).await {
        Ok(product) => ProductShowTemplate {
            product: ProductView::from(&product),
        }
        .into_response(),
        Err(e) => {
            if e.is_not_found() {
                tracing::debug!(product_id = %product_id, "Product not found");
            } else {
                tracing::error!(error = %e, product_id = %product_id, "Error fetching product");
            }
            (StatusCode::NOT_FOUND, ProductNotFoundTemplate).into_response()
        }
    }
}
