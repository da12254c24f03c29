//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::{CommerceAdminClient, CommerceError, ProductWriter};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable; holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    products: Arc<dyn ProductWriter>,
}

impl AppState {
    /// Create a new application state backed by the REST client.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce client cannot be built from the
    /// configured key.
    pub fn new(config: AdminConfig) -> Result<Self, CommerceError> {
        let client = CommerceAdminClient::new(&config.commerce)?;
        Ok(Self::with_writer(config, Arc::new(client)))
    }

    /// Create application state around an existing product writer.
    #[must_use]
    pub fn with_writer(config: AdminConfig, products: Arc<dyn ProductWriter>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, products }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get the product writer.
    #[must_use]
    pub fn products(&self) -> &dyn ProductWriter {
        self.inner.products.as_ref()
    }
}
