//! Local cart inspection.
//!
//! Works on the same slot file the storefront writes.

use std::path::Path;

use lumina_core::cart::{CartLine, CartRepository, CartStore};
use lumina_core::checkout::{CartView, cart_view};
use lumina_core::format_cop;
use lumina_storefront::backend::CatalogClient;
use lumina_storefront::cart_slot::FileCartRepository;
use lumina_storefront::config::StorefrontConfig;
use tracing::info;

use super::{CliError, fetch_catalog};

/// Print the cart. With `priced`, the catalog is fetched and totals shown.
///
/// # Errors
///
/// Returns an error if `priced` is set and the catalog cannot be fetched.
pub async fn show(dir: &Path, priced: bool) -> Result<(), CliError> {
    let repository = FileCartRepository::new(dir);
    info!(path = %repository.path().display(), "Reading cart");

    if priced {
        let config = StorefrontConfig::from_env()?;
        let client = CatalogClient::new(&config.backend)
            .map_err(|e| CliError::InvalidUrl(e.to_string()))?;
        let catalog = fetch_catalog(&client).await?;
        print_view(&cart_view(&repository.load(), &catalog, &config.shipping));
    } else {
        print_lines(&repository.load());
    }
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the slot cannot be written.
pub fn clear(dir: &Path) -> Result<(), CliError> {
    let mut store = CartStore::new(FileCartRepository::new(dir));
    let removed = store.total_item_count();
    store.clear()?;
    info!(items = removed, "Cart cleared");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_lines(lines: &[CartLine]) {
    if lines.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in lines {
        println!(
            "{:>3} x {} / {} / {}",
            line.qty, line.product_id, line.size_label, line.color
        );
    }
    let count: u32 = lines.iter().map(|l| l.qty).sum();
    println!("{count} items");
}

#[allow(clippy::print_stdout)]
fn print_view(view: &CartView) {
    if view.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in &view.lines {
        println!(
            "{:>3} x {:<32} {} / {}  {}",
            line.qty,
            line.product_name,
            line.size_label,
            line.color,
            format_cop(line.line_total),
        );
    }
    for key in &view.stale {
        println!("  (no longer available: {})", key.product_id);
    }
    println!("Subtotal {}", format_cop(view.subtotal));
    println!("Envío    {}", format_cop(view.shipping));
    println!("Total    {}", format_cop(view.total));
}
