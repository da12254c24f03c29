//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `COMMERCE_PUBLIC_KEY` - Commerce backend public API key
//! - `COMMERCE_SECRET_KEY` - Commerce backend secret API key (order lookup)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `COMMERCE_API_URL` - Backend REST base URL (default: <https://api.chec.io/v1>)
//! - `COMMERCE_TIMEOUT_SECS` - Per-request timeout for backend calls (default: 30)
//! - `COMMERCE_SHIPPING_METHOD` - Shipping method ID sent with every capture
//! - `COMMERCE_PAYMENT_GATEWAY` - Payment gateway sent with every capture (default: `test_gateway`)
//! - `ADMIN_PROXY_URL` - Base URL of the admin proxy (default: <http://127.0.0.1:3001>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Default backend REST endpoint.
pub const DEFAULT_COMMERCE_API_URL: &str = "https://api.chec.io/v1";

/// Default shipping method for captured orders.
pub const DEFAULT_SHIPPING_METHOD: &str = "ship_7RyWOwmK5nEa2V";

/// Default payment gateway for captured orders.
pub const DEFAULT_PAYMENT_GATEWAY: &str = "test_gateway";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Commerce backend configuration
    pub commerce: CommerceConfig,
    /// Values injected into every capture payload
    pub checkout: CheckoutSettings,
    /// Base URL of the admin proxy used by the add-product page
    pub admin_proxy_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Commerce backend configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CommerceConfig {
    /// REST base URL, without trailing slash
    pub api_url: String,
    /// Public API key (catalog, cart, checkout)
    pub public_key: String,
    /// Secret API key (server-side only, used for order lookup)
    pub secret_key: SecretString,
    /// Timeout applied to every backend request
    pub timeout: Duration,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("api_url", &self.api_url)
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fixed checkout values that the integrator chooses per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Shipping method ID for the fulfillment block
    pub shipping_method: String,
    /// Payment gateway name for the payment block
    pub payment_gateway: String,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            shipping_method: DEFAULT_SHIPPING_METHOD.to_string(),
            payment_gateway: DEFAULT_PAYMENT_GATEWAY.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_url("STOREFRONT_BASE_URL")?;
        let static_dir = get_env_or_default("STOREFRONT_STATIC_DIR", "crates/storefront/static");

        let commerce = CommerceConfig::from_env()?;
        let checkout = CheckoutSettings {
            shipping_method: get_env_or_default(
                "COMMERCE_SHIPPING_METHOD",
                DEFAULT_SHIPPING_METHOD,
            ),
            payment_gateway: get_env_or_default(
                "COMMERCE_PAYMENT_GATEWAY",
                DEFAULT_PAYMENT_GATEWAY,
            ),
        };
        let admin_proxy_url = get_optional_url("ADMIN_PROXY_URL")?
            .unwrap_or_else(|| "http://127.0.0.1:3001".to_string());

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            commerce,
            checkout,
            admin_proxy_url,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Scheme, host and port of the admin proxy, for the CSP.
    #[must_use]
    pub fn admin_proxy_origin(&self) -> String {
        url::Url::parse(&self.admin_proxy_url).map_or_else(
            |_| self.admin_proxy_url.clone(),
            |url| url.origin().ascii_serialization(),
        )
    }

    /// Product creation endpoint on the admin proxy.
    #[must_use]
    pub fn admin_products_endpoint(&self) -> String {
        format!("{}/api/products", self.admin_proxy_url)
    }
}

impl CommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_optional_url("COMMERCE_API_URL")?
            .unwrap_or_else(|| DEFAULT_COMMERCE_API_URL.to_string());
        let timeout_secs = get_env_or_default("COMMERCE_TIMEOUT_SECS", "")
            .parse::<u64>()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            public_key: get_required_env("COMMERCE_PUBLIC_KEY")?,
            secret_key: get_validated_secret("COMMERCE_SECRET_KEY")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required absolute URL, with any trailing slash removed.
fn get_required_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    normalize_url(key, &value)
}

/// Get an optional absolute URL, with any trailing slash removed.
fn get_optional_url(key: &str) -> Result<Option<String>, ConfigError> {
    get_optional_env(key)
        .map(|value| normalize_url(key, &value))
        .transpose()
}

fn normalize_url(key: &str, value: &str) -> Result<String, ConfigError> {
    url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the commerce dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
