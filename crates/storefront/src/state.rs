//! Application state shared across handlers.

use std::sync::Arc;

use crate::collaborators::{CatalogStore, OrderWriter, PaymentGateway};
use crate::config::StorefrontConfig;
use crate::services::CheckoutService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the checkout service wired to its collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `catalog` - Product detail source
    /// * `payments` - Charge intent gateway
    /// * `orders` - Order sink
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Arc<dyn CatalogStore>,
        payments: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderWriter>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                checkout: CheckoutService::new(catalog, payments, orders),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
