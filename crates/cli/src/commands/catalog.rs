//! Catalog browsing commands.
//!
//! # Environment Variables
//!
//! - `LUMINA_BACKEND_URL` - Base URL of the hosted backend project
//! - `LUMINA_BACKEND_ANON_KEY` - Public (anon) API key

use lumina_core::format_cop;
use lumina_core::listing::{ListingEntry, ListingFilters, SortKey, listing_view};
use lumina_storefront::backend::CatalogClient;
use lumina_storefront::config::StorefrontConfig;
use tracing::info;

use super::{CliError, fetch_catalog};

/// List the product grid, filtered and sorted like the storefront.
///
/// # Errors
///
/// Returns an error if configuration is missing or the products cannot be
/// fetched.
pub async fn list(filters: &ListingFilters, sort: SortKey) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let client =
        CatalogClient::new(&config.backend).map_err(|e| CliError::InvalidUrl(e.to_string()))?;

    let catalog = fetch_catalog(&client).await?;
    info!(products = catalog.len(), "Catalog loaded");

    let entries = listing_view(&catalog, filters, sort);
    print_listing(&entries, sort);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_listing(entries: &[ListingEntry], sort: SortKey) {
    println!("{} products (sort: {sort})", entries.len());
    for entry in entries {
        let product = &entry.product;
        let marker = if product.featured { "*" } else { " " };
        let was = if entry.from_price_pre_discount > entry.from_price_final {
            format!("  (antes {})", format_cop(entry.from_price_pre_discount))
        } else {
            String::new()
        };
        println!(
            "{marker} {:<12} {:<32} {:<14} desde {}{was}",
            product.id,
            product.name,
            product.category,
            format_cop(entry.from_price_final),
        );
    }
}
