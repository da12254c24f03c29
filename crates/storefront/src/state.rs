//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::{CommerceApi, CommerceClient, CommerceError};
use crate::config::StorefrontConfig;
use crate::services::QuantitySequencer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the commerce backend, the quantity update sequencer and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: Arc<dyn CommerceApi>,
    quantities: QuantitySequencer,
}

impl AppState {
    /// Create a new application state backed by the REST client.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce client cannot be built from the
    /// configured keys.
    pub fn new(config: StorefrontConfig) -> Result<Self, CommerceError> {
        let commerce = CommerceClient::new(&config.commerce)?;
        Ok(Self::with_commerce(config, Arc::new(commerce)))
    }

    /// Create application state around an existing backend implementation.
    #[must_use]
    pub fn with_commerce(config: StorefrontConfig, commerce: Arc<dyn CommerceApi>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                quantities: QuantitySequencer::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce backend.
    #[must_use]
    pub fn commerce(&self) -> &dyn CommerceApi {
        self.inner.commerce.as_ref()
    }

    /// Get a reference to the quantity update sequencer.
    #[must_use]
    pub fn quantities(&self) -> &QuantitySequencer {
        &self.inner.quantities
    }
}
