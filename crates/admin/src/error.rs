//! Unified error handling for the admin proxy.
//!
//! Every failure answers `500` with `{"error": <message>}` so the caller sees
//! one envelope whether the body was malformed or the backend refused.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::commerce::CommerceError;

/// Application-level error type for the admin proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Request body was not valid JSON.
    #[error("{0}")]
    MalformedBody(#[from] serde_json::Error),

    /// Commerce backend operation failed.
    #[error("{0}")]
    Commerce(#[from] CommerceError),
}

impl ProxyError {
    /// Message placed in the error envelope.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Commerce(err) => err
                .api_message()
                .map_or_else(|| err.to_string(), str::to_string),
            Self::MalformedBody(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Admin proxy request error"
        );

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.message() })),
        )
            .into_response()
    }
}
