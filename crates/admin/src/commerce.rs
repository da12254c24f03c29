//! Commerce backend product creation.
//!
//! # Security
//!
//! Product creation requires the backend's secret key. It lives only in this
//! binary and is sent only with `POST /products`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use cornerstore_core::ApiErrorBody;

use crate::config::CommerceWriteConfig;

/// Header carrying the API key.
const AUTH_HEADER: &str = "X-Authorization";

/// Errors from the product creation call.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Nested `error.message` from the response body, if any.
        message: Option<String>,
    },

    /// Secret key contains characters not allowed in a header.
    #[error("Invalid API key: {0}")]
    InvalidKey(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CommerceError {
    /// The backend's nested error message, if the failure carried one.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Product fields forwarded to the backend.
///
/// `name` and `description` pass through untouched; missing ones are left
/// out. `price` is always sent, as `null` when it could not be coerced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    #[serde(skip_serializing_if = "Value::is_null")]
    pub name: Value,
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub description: Value,
}

#[derive(Serialize)]
struct CreateProductBody<'a> {
    product: &'a NewProduct,
}

/// Creates products in the commerce backend.
#[async_trait]
pub trait ProductWriter: Send + Sync {
    /// Create a product and return the backend's product JSON.
    async fn create_product(&self, product: &NewProduct) -> Result<Value, CommerceError>;
}

/// REST client for the backend's product creation endpoint.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct CommerceAdminClient {
    inner: Arc<CommerceAdminClientInner>,
}

struct CommerceAdminClientInner {
    client: reqwest::Client,
    endpoint: String,
    secret_key: HeaderValue,
}

impl CommerceAdminClient {
    /// Create a new admin client.
    ///
    /// # Errors
    ///
    /// Returns an error if the key contains invalid header characters or the
    /// HTTP client fails to build.
    pub fn new(config: &CommerceWriteConfig) -> Result<Self, CommerceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let mut secret_key = HeaderValue::from_str(config.secret_key.expose_secret())
            .map_err(|e| CommerceError::InvalidKey(e.to_string()))?;
        secret_key.set_sensitive(true);

        Ok(Self {
            inner: Arc::new(CommerceAdminClientInner {
                client,
                endpoint: format!("{}/products", config.api_url.trim_end_matches('/')),
                secret_key,
            }),
        })
    }
}

#[async_trait]
impl ProductWriter for CommerceAdminClient {
    #[instrument(skip(self, product))]
    async fn create_product(&self, product: &NewProduct) -> Result<Value, CommerceError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(AUTH_HEADER, self.inner.secret_key.clone())
            .json(&CreateProductBody { product })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = ApiErrorBody::parse(&body).message().map(str::to_string);
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Product creation rejected"
            );
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
