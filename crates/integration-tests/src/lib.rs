//! Integration test support for Lumina.
//!
//! Provides an in-memory [`CatalogSource`] and a seeded catalog so the
//! storefront API can be exercised end to end without a backend.
//!
//! # Test Categories
//!
//! - `storefront_api` - JSON API over a real `Shop` with a file-backed cart
//! - `admin_console` - Admin flows against the in-memory admin backend

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use lumina_core::checkout::ShippingPolicy;
use lumina_core::shop::Shop;
use lumina_core::{Product, ProductId, SizeId, SizeVariant};
use lumina_storefront::backend::{BackendError, CatalogSource, FetchError};
use lumina_storefront::cart_slot::FileCartRepository;
use lumina_storefront::routes;
use lumina_storefront::state::AppState;

/// Catalog source backed by vectors. Either collection can be made to fail.
#[derive(Default)]
pub struct StaticCatalog {
    products: Mutex<Vec<Product>>,
    sizes: Mutex<Vec<SizeVariant>>,
    products_down: AtomicBool,
    sizes_down: AtomicBool,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(products: Vec<Product>, sizes: Vec<SizeVariant>) -> Self {
        Self {
            products: Mutex::new(products),
            sizes: Mutex::new(sizes),
            ..Self::default()
        }
    }

    /// Replace the stored products, as an admin write would.
    pub fn set_products(&self, products: Vec<Product>) {
        *self.products.lock().unwrap_or_else(PoisonError::into_inner) = products;
    }

    /// Replace the stored sizes.
    pub fn set_sizes(&self, sizes: Vec<SizeVariant>) {
        *self.sizes.lock().unwrap_or_else(PoisonError::into_inner) = sizes;
    }

    pub fn set_products_down(&self, down: bool) {
        self.products_down.store(down, Ordering::SeqCst);
    }

    pub fn set_sizes_down(&self, down: bool) {
        self.sizes_down.store(down, Ordering::SeqCst);
    }
}

fn unavailable() -> FetchError {
    BackendError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
        if self.products_down.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn fetch_size_variants(&self) -> Result<Vec<SizeVariant>, FetchError> {
        if self.sizes_down.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// A product row as the backend would return it.
#[must_use]
pub fn product(id: &str, name: &str, category: &str, base_price: i64, discount: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: category.to_string(),
        description: String::new(),
        base_price,
        discount_percent: discount,
        featured: false,
        colors: Vec::new(),
        image_url: None,
        image_path: None,
        created_at: None,
        updated_at: None,
    }
}

/// A size row.
#[must_use]
pub fn size(id: &str, product_id: &str, label: &str, extra_price: i64) -> SizeVariant {
    SizeVariant {
        id: SizeId::new(id),
        product_id: ProductId::new(product_id),
        label: label.to_string(),
        extra_price,
    }
}

/// Midnight UTC on the given day of January 2025.
#[must_use]
pub fn day(day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).single()
}

/// The seeded jewelry catalog used across the API tests.
///
/// - `luna`: Manilla Luna, 50000 at 20% off, sizes M (+5000) and L (+8000), two colors
/// - `sol`: Collar Sol, 140000, featured, no stored sizes
/// - `estrella`: Aretes Estrella, 10000
#[must_use]
pub fn seeded_catalog() -> StaticCatalog {
    let mut luna = product("luna", "Manilla Luna", "manillas", 50_000, 20);
    luna.colors = vec!["Dorado".to_string(), "Plateado".to_string()];
    luna.created_at = day(3);

    let mut sol = product("sol", "Collar Sol", "collares", 140_000, 0);
    sol.featured = true;
    sol.created_at = day(1);

    let mut estrella = product("estrella", "Aretes Estrella", "aretes", 10_000, 0);
    estrella.created_at = day(2);

    StaticCatalog::new(
        vec![luna, estrella, sol],
        vec![
            size("luna-m", "luna", "M", 5_000),
            size("luna-l", "luna", "L", 8_000),
        ],
    )
}

/// The full storefront router over `source`, with the cart slot in `cart_dir`.
#[must_use]
pub fn storefront(source: Arc<StaticCatalog>, cart_dir: &Path) -> Router {
    let shop = Shop::new(FileCartRepository::new(cart_dir), ShippingPolicy::default());
    routes::app(AppState::new(source, shop))
}
