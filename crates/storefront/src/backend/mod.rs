//! Read-only access to the hosted catalog backend.
//!
//! The storefront only ever reads two tables: `products` and
//! `product_sizes`. [`CatalogSource`] is the port the catalog refresh
//! depends on; [`CatalogClient`] implements it over the backend's REST API.

mod client;

use async_trait::async_trait;
use lumina_core::{Product, SizeVariant};
use thiserror::Error;

pub use client::CatalogClient;

/// Errors from backend reads.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure to read the catalog.
pub type FetchError = BackendError;

/// Source of catalog rows.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All products, newest first.
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError>;

    /// All size variants of all products.
    async fn fetch_size_variants(&self) -> Result<Vec<SizeVariant>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = BackendError::Status {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned 401: Invalid API key");
    }
}
