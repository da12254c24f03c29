//! HTTP route handlers for the admin proxy.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health         - Health check
//! POST /api/products   - Create a product (JSON in, product JSON out)
//! ```

pub mod products;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create all routes for the admin proxy.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/products", post(products::create))
}

/// Build the full application with middleware.
///
/// Sentry layers are added by the binary so tests can run without a client.
pub fn app(state: AppState) -> Router {
    let cors = create_cors_layer(state.config().allowed_origin.as_deref());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the storefront's add-product form.
///
/// Restricted to the configured origin when one is set and parses as a
/// header value.
fn create_cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Ignoring unusable ADMIN_ALLOWED_ORIGIN");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::commerce::{CommerceError, NewProduct, ProductWriter};
    use crate::config::{AdminConfig, CommerceWriteConfig, DEFAULT_COMMERCE_API_URL};

    #[derive(Default)]
    struct RecordingWriter {
        received: Mutex<Vec<NewProduct>>,
        reject_with: Option<String>,
    }

    #[async_trait]
    impl ProductWriter for RecordingWriter {
        async fn create_product(&self, product: &NewProduct) -> Result<Value, CommerceError> {
            self.received.lock().unwrap().push(product.clone());
            match &self.reject_with {
                Some(message) => Err(CommerceError::Api {
                    status: 422,
                    message: Some(message.clone()),
                }),
                None => Ok(json!({
                    "id": "prod_new",
                    "name": product.name,
                    "price": {"raw": product.price, "formatted_with_symbol": "$12.50"},
                })),
            }
        }
    }

    fn test_config(allowed_origin: Option<&str>) -> AdminConfig {
        AdminConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            allowed_origin: allowed_origin.map(str::to_string),
            commerce: CommerceWriteConfig {
                api_url: DEFAULT_COMMERCE_API_URL.to_string(),
                secret_key: SecretString::from("sk_5f7Qz9LmN2xR8tVb4KcW1hJd"),
                timeout: Duration::from_secs(30),
            },
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn post_products(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/products")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_product_forwards_coerced_price() {
        let writer = Arc::new(RecordingWriter::default());
        let app = app(AppState::with_writer(test_config(None), writer.clone()));

        let response = app
            .oneshot(post_products(
                r#"{"name": "Soap", "price": "12.50", "description": "Lavender"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], "prod_new");

        let received = writer.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].name, json!("Soap"));
        assert_eq!(received[0].price, Some(12.5));
        assert_eq!(received[0].description, json!("Lavender"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_500_without_backend_call() {
        let writer = Arc::new(RecordingWriter::default());
        let app = app(AppState::with_writer(test_config(None), writer.clone()));

        let response = app.oneshot(post_products("{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
        assert!(writer.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_rejection_is_500_with_message() {
        let writer = Arc::new(RecordingWriter {
            reject_with: Some("The name field is required.".to_string()),
            ..Default::default()
        });
        let app = app(AppState::with_writer(test_config(None), writer));

        let response = app
            .oneshot(post_products(r#"{"price": "abc"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"error": "The name field is required."})
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let writer = Arc::new(RecordingWriter::default());
        let app = app(AppState::with_writer(
            test_config(Some("http://127.0.0.1:3000")),
            writer,
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/products")
                    .header("origin", "http://127.0.0.1:3000")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://127.0.0.1:3000")
        );
    }

    #[tokio::test]
    async fn test_health() {
        let writer = Arc::new(RecordingWriter::default());
        let app = app(AppState::with_writer(test_config(None), writer));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
