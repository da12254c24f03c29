//! Error body returned by the commerce backend.
//!
//! Every non-2xx response carries the same envelope:
//!
//! ```json
//! {"status_code": 422, "error": {"type": "gateway_error", "message": "Card declined"}}
//! ```

use serde::{Deserialize, Serialize};

/// Top-level error envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// HTTP status echoed by the backend.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Nested error details.
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

/// Nested error details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Error category (e.g., `validation`, `not_found`, `gateway_error`).
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Human-readable message, safe to show to shoppers.
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parse an error body, tolerating bodies that are not JSON at all.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// The nested `error.message`, if present and non-empty.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|detail| detail.message.as_deref())
            .filter(|message| !message.is_empty())
    }
}
