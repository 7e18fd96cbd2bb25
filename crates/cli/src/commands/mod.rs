//! Command implementations.

pub mod admin;
pub mod cart;
pub mod catalog;

use lumina_core::catalog::CatalogIndex;
use lumina_storefront::backend::{BackendError, CatalogSource};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Storefront configuration error: {0}")]
    StorefrontConfig(#[from] lumina_storefront::config::ConfigError),

    #[error("Admin configuration error: {0}")]
    AdminConfig(#[from] lumina_admin::config::ConfigError),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Catalog fetch failed: {0}")]
    Fetch(#[from] BackendError),

    #[error("Cart storage error: {0}")]
    Cart(#[from] lumina_core::cart::CartStoreError),

    #[error(transparent)]
    Admin(#[from] lumina_admin::AdminError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetch the whole catalog. A size fetch failure falls back to default
/// sizes, as the storefront does.
async fn fetch_catalog(source: &dyn CatalogSource) -> Result<CatalogIndex, CliError> {
    let products = source.fetch_products().await?;
    let variants = match source.fetch_size_variants().await {
        Ok(variants) => variants,
        Err(e) => {
            tracing::warn!(error = %e, "Size fetch failed, using default sizes");
            Vec::new()
        }
    };
    Ok(CatalogIndex::build(products, variants))
}
