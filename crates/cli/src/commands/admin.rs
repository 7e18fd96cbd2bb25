//! Product management commands.
//!
//! # Environment Variables
//!
//! - `LUMINA_BACKEND_URL` - Base URL of the hosted backend project
//! - `LUMINA_BACKEND_ANON_KEY` - Public (anon) API key
//! - `LUMINA_STORAGE_BUCKET` - Product image bucket (default: product-images)
//! - `LUMINA_ADMIN_EMAIL` - Admin account email
//! - `LUMINA_ADMIN_PASSWORD` - Admin account password

use std::path::Path;

use lumina_admin::backend::{AdminClient, ImageUpload};
use lumina_admin::config::AdminConfig;
use lumina_admin::products::ProductForm;
use lumina_admin::services::{AdminConsole, ProductRow};
use lumina_core::{ProductId, format_cop};
use secrecy::SecretString;
use tracing::info;

use super::CliError;

/// Sign in with the credentials from the environment.
async fn connect() -> Result<AdminConsole<AdminClient>, CliError> {
    dotenvy::dotenv().ok();
    let config = AdminConfig::from_env()?;

    let email = std::env::var("LUMINA_ADMIN_EMAIL")
        .map_err(|_| CliError::MissingEnvVar("LUMINA_ADMIN_EMAIL"))?;
    let password = std::env::var("LUMINA_ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("LUMINA_ADMIN_PASSWORD"))?;

    let client = AdminClient::new(&config).map_err(|e| CliError::InvalidUrl(e.to_string()))?;
    info!(%email, "Signing in");
    Ok(AdminConsole::connect(client, &email, &password).await?)
}

/// List products with their "from" prices.
///
/// # Errors
///
/// Returns an error if sign-in fails or the user is not an admin.
pub async fn list() -> Result<(), CliError> {
    let mut console = connect().await?;
    let outcome = console.refresh().await?;
    if let Some(e) = &outcome.sizes_error {
        tracing::warn!(error = %e, "Sizes could not be loaded");
    }
    print_rows(&console.product_rows());
    console.sign_out().await?;
    Ok(())
}

/// Create or update a product.
///
/// # Errors
///
/// Returns an error if the form is invalid, the image cannot be read, or a
/// backend write fails.
pub async fn save(
    id: Option<String>,
    form: &ProductForm,
    image: Option<&Path>,
) -> Result<(), CliError> {
    // Validate before signing in
    form.parse().map_err(lumina_admin::AdminError::from)?;

    let image = match image {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };

    let mut console = connect().await?;
    let id = id.map(ProductId::new);
    let saved = console.save_product(id.as_ref(), form, image).await?;
    info!(product_id = %saved.id, name = %saved.name, "Product saved");
    console.sign_out().await?;
    Ok(())
}

/// Delete a product and its sizes.
///
/// # Errors
///
/// Returns an error if sign-in or the delete fails.
pub async fn delete(id: &str) -> Result<(), CliError> {
    let mut console = connect().await?;
    let id = ProductId::new(id);
    console.delete_product(&id).await?;
    info!(product_id = %id, "Product deleted");
    console.sign_out().await?;
    Ok(())
}

async fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = match path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("webp") => "image/webp",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    };
    Ok(ImageUpload {
        filename,
        content_type: content_type.to_string(),
        bytes,
    })
}

#[allow(clippy::print_stdout)]
fn print_rows(rows: &[ProductRow]) {
    println!("{} products", rows.len());
    for row in rows {
        let marker = if row.featured { "*" } else { " " };
        println!(
            "{marker} {:<38} {:<32} {:<14} {:>2} sizes  -{:>3}%  desde {}",
            row.id,
            row.name,
            row.category,
            row.size_count,
            row.discount_percent,
            format_cop(row.from_price.final_price),
        );
    }
}
