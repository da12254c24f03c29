//! Add-product page.
//!
//! The form posts JSON straight to the admin proxy; the storefront never
//! holds the secret key.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use crate::filters;
use crate::state::AppState;

/// Add-product page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/add_product.html")]
pub struct AddProductTemplate {
    /// Admin proxy product creation URL.
    pub endpoint: String,
}

/// Display the add-product form.
pub async fn add_product(State(state): State<AppState>) -> impl IntoResponse {
    AddProductTemplate {
        endpoint: state.config().admin_products_endpoint(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_posts_json_to_proxy() {
        let html = AddProductTemplate {
            endpoint: "http://127.0.0.1:3001/api/products".to_string(),
        }
        .render()
        .unwrap();

        assert!(html.contains("hx-post=\"http://127.0.0.1:3001/api/products\""));
        assert!(html.contains("hx-ext=\"json-enc\""));
        assert!(html.contains("name=\"price\""));
    }
}
