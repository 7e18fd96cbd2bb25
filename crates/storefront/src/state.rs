//! Application state shared across handlers.

use std::sync::Arc;

use lumina_core::shop::Shop;
use tokio::sync::{Mutex, MutexGuard};

use crate::backend::{CatalogClient, CatalogSource};
use crate::cart_slot::FileCartRepository;
use crate::config::StorefrontConfig;
use crate::services::catalog::RefreshLock;

/// The shop as served by the storefront: cart persisted to a file.
pub type StorefrontShop = Shop<FileCartRepository>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The [`Shop`] sits behind a
/// single async mutex, so cart and catalog mutations never interleave.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    source: Arc<dyn CatalogSource>,
    shop: Mutex<StorefrontShop>,
    refresh_lock: RefreshLock,
}

impl AppState {
    /// Create a new application state from its parts.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, shop: StorefrontShop) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                source,
                shop: Mutex::new(shop),
                refresh_lock: RefreshLock::new(),
            }),
        }
    }

    /// Create the state for a running server: backend client from the
    /// config, cart slot in the configured directory, empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL cannot be used as a REST base.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, url::ParseError> {
        let source = CatalogClient::new(&config.backend)?;
        let shop = Shop::new(FileCartRepository::new(&config.cart_dir), config.shipping);
        Ok(Self::new(Arc::new(source), shop))
    }

    /// Get the catalog source.
    #[must_use]
    pub fn source(&self) -> &dyn CatalogSource {
        self.inner.source.as_ref()
    }

    /// Get the shop mutex, for operations that fetch before locking.
    #[must_use]
    pub fn shop_mutex(&self) -> &Mutex<StorefrontShop> {
        &self.inner.shop
    }

    /// Serializes catalog refreshes.
    #[must_use]
    pub fn refresh_lock(&self) -> &RefreshLock {
        &self.inner.refresh_lock
    }

    /// Lock the shop.
    pub async fn shop(&self) -> MutexGuard<'_, StorefrontShop> {
        self.inner.shop.lock().await
    }
}
