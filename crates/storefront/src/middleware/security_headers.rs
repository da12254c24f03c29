//! Security headers middleware for XSS, clickjacking, and sniffing protection.
//!
//! Adds restrictive security headers to all responses. The CSP is locked down
//! except where the pages need it: HTMX from unpkg, product images from the
//! commerce CDN, and the add-product form posting to the admin proxy.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Script host serving HTMX and its JSON encoding extension.
pub const SCRIPT_CDN: &str = "https://unpkg.com";

/// Build the Content-Security-Policy value.
///
/// `admin_origin` is added to `connect-src` so the add-product form can reach
/// the admin proxy.
#[must_use]
pub fn content_security_policy(admin_origin: &str) -> String {
    format!(
        "default-src 'none'; \
         script-src 'self' {SCRIPT_CDN}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' https:; \
         connect-src 'self' {admin_origin}; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - see [`content_security_policy`]
/// - `Cache-Control: no-store, max-age=0` - Cart and checkout pages are per-shopper
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    let csp = content_security_policy(&state.config().admin_proxy_origin());
    match HeaderValue::from_str(&csp) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::warn!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_admin_origin_and_script_cdn() {
        let csp = content_security_policy("http://127.0.0.1:3001");
        assert!(csp.contains("connect-src 'self' http://127.0.0.1:3001;"));
        assert!(csp.contains("script-src 'self' https://unpkg.com;"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_csp_is_valid_header_value() {
        let csp = content_security_policy("https://admin.example.org");
        assert!(HeaderValue::from_str(&csp).is_ok());
    }
}
