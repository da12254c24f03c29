//! Product creation proxy.

use std::sync::LazyLock;

use axum::{Json, body::Bytes, extract::State};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::commerce::NewProduct;
use crate::error::ProxyError;
use crate::state::AppState;

/// Longest leading decimal literal, as `parseFloat` reads it.
static FLOAT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("Invalid regex")
});

/// Incoming body. Only JSON parsing is enforced; any field may be missing
/// or of any type.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub description: Value,
}

impl ProductInput {
    fn into_new_product(self) -> NewProduct {
        NewProduct {
            price: coerce_price(&self.price),
            name: self.name,
            description: self.description,
        }
    }
}

/// Coerce a price the way a browser's `parseFloat` would.
///
/// Numbers pass through. Strings use their longest leading numeric prefix
/// after leading whitespace. Everything else, and any non-finite result,
/// becomes `None`.
#[must_use]
pub fn coerce_price(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim_start();
            FLOAT_PREFIX_RE
                .find(text)
                .and_then(|m| m.as_str().parse::<f64>().ok())
        }
        _ => None,
    };
    parsed.filter(|price| price.is_finite())
}

/// Create a product in the commerce backend.
///
/// Answers with the backend's product JSON.
#[instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let input: ProductInput = serde_json::from_slice(&body)?;
    let product = input.into_new_product();

    let created = state.products().create_product(&product).await?;

    tracing::info!(product_id = created_id(&created), "Product created");
    Ok(Json(created))
}

/// ID of a product the backend returned, or empty if it has none.
fn created_id(product: &Value) -> &str {
    product
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(coerce_price(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_price(&json!(3)), Some(3.0));
    }

    #[test]
    fn test_strings_use_numeric_prefix() {
        assert_eq!(coerce_price(&json!("12.50")), Some(12.5));
        assert_eq!(coerce_price(&json!("  7")), Some(7.0));
        assert_eq!(coerce_price(&json!("19.99 USD")), Some(19.99));
        assert_eq!(coerce_price(&json!(".5")), Some(0.5));
        assert_eq!(coerce_price(&json!("-2e2x")), Some(-200.0));
        assert_eq!(coerce_price(&json!("4.")), Some(4.0));
    }

    #[test]
    fn test_unparseable_becomes_none() {
        assert_eq!(coerce_price(&json!("abc")), None);
        assert_eq!(coerce_price(&json!("")), None);
        assert_eq!(coerce_price(&json!(null)), None);
        assert_eq!(coerce_price(&json!(true)), None);
        assert_eq!(coerce_price(&json!({"amount": 3})), None);
        assert_eq!(coerce_price(&json!("1e999")), None);
    }

    #[test]
    fn test_input_keeps_name_and_description_as_given() {
        let input: ProductInput =
            serde_json::from_str(r#"{"name": "Soap", "price": "4.25", "description": 7}"#)
                .unwrap();
        let product = input.into_new_product();
        assert_eq!(product.name, json!("Soap"));
        assert_eq!(product.price, Some(4.25));
        assert_eq!(product.description, json!(7));
    }

    #[test]
    fn test_missing_fields_default_to_null() {
        let input: ProductInput = serde_json::from_str("{}").unwrap();
        let product = input.into_new_product();
        assert!(product.name.is_null());
        assert_eq!(product.price, None);
        assert!(product.description.is_null());
    }

    #[test]
    fn test_created_id_reads_backend_id() {
        assert_eq!(created_id(&json!({"id": "prod_9", "name": "Soap"})), "prod_9");
        assert_eq!(created_id(&json!({"id": 9})), "");
        assert_eq!(created_id(&json!({"name": "Soap"})), "");
    }
}
