//! REST client for the catalog tables.

use std::sync::Arc;

use async_trait::async_trait;
use lumina_core::rest::{PRODUCT_COLUMNS, SIZE_COLUMNS, error_message};
use lumina_core::{Product, SizeVariant};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{BackendError, CatalogSource, FetchError};
use crate::config::BackendConfig;

/// Client for the backend's REST endpoint, authenticated with the anon key.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    /// `.../rest/v1/`, with the trailing slash so table names join onto it.
    rest_endpoint: Url,
    anon_key: String,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured backend URL cannot hold a REST path.
    pub fn new(config: &BackendConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                rest_endpoint: Url::parse(&config.endpoint("rest/v1/"))?,
                anon_key: config.anon_key.expose_secret().to_string(),
            }),
        })
    }

    /// Select rows from a table.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, BackendError> {
        let mut url = self.inner.rest_endpoint.join(table)?;
        url.query_pairs_mut().extend_pairs(query);

        let response = self
            .inner
            .client
            .get(url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&self.inner.anon_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                table,
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(&response_text),
            });
        }

        let rows: Vec<T> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                table,
                "Failed to parse backend rows"
            );
            BackendError::Parse(e)
        })?;

        debug!(table, rows = rows.len(), "Fetched rows");
        Ok(rows)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
        self.select(
            "products",
            &[("select", PRODUCT_COLUMNS), ("order", "created_at.desc")],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn fetch_size_variants(&self) -> Result<Vec<SizeVariant>, FetchError> {
        self.select("product_sizes", &[("select", SIZE_COLUMNS)])
            .await
    }
}
