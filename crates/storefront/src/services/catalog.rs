//! Catalog refresh.
//!
//! Both collections are fetched before the shop is locked, and the new
//! [`CatalogIndex`] replaces the old one in a single assignment. Refreshes
//! are serialized through a [`RefreshLock`], so a slow fetch that started
//! first can never install its catalog over a newer one.
//!
//! - Products fail: the current catalog stays in place and the error is
//!   returned.
//! - Sizes fail: the fresh products are installed without stored variants
//!   (every product offers the default size) and the failure is reported in
//!   the [`RefreshReport`].

use lumina_core::cart::CartRepository;
use lumina_core::catalog::CatalogIndex;
use lumina_core::shop::Shop;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::backend::{CatalogSource, FetchError};

/// Summary of a completed refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub products: usize,
    pub size_variants: usize,
    /// Set when sizes could not be fetched and defaults are in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes_error: Option<String>,
}

/// Held for the whole fetch-and-install of one refresh.
#[derive(Debug, Default)]
pub struct RefreshLock(Mutex<()>);

impl RefreshLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Fetch the catalog and install it into `shop`.
///
/// # Errors
///
/// Returns the fetch error if products could not be read. The shop keeps
/// its previous catalog in that case.
#[instrument(skip_all)]
pub async fn refresh_catalog<R: CartRepository>(
    source: &dyn CatalogSource,
    shop: &Mutex<Shop<R>>,
    lock: &RefreshLock,
) -> Result<RefreshReport, FetchError> {
    let _refreshing = lock.0.lock().await;

    let products = match source.fetch_products().await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products, keeping current catalog");
            return Err(e);
        }
    };

    let (variants, sizes_error) = match source.fetch_size_variants().await {
        Ok(variants) => (variants, None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch sizes, using default sizes");
            (Vec::new(), Some(e.to_string()))
        }
    };

    let report = RefreshReport {
        products: products.len(),
        size_variants: variants.len(),
        sizes_error,
    };
    let catalog = CatalogIndex::build(products, variants);

    shop.lock().await.replace_catalog(catalog);
    tracing::info!(
        products = report.products,
        size_variants = report.size_variants,
        "Catalog refreshed"
    );

    Ok(report)
}
