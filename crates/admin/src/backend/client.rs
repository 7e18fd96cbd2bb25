//! HTTP client for the backend's auth, REST and storage APIs.

use std::sync::Arc;

use async_trait::async_trait;
use lumina_core::rest::{PRODUCT_COLUMNS, SIZE_COLUMNS, error_message};
use lumina_core::{Product, ProductId, SizeVariant};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use super::{AdminBackend, ImageUpload, Session, StoredImage};
use crate::config::AdminConfig;
use crate::error::{AdminError, Result};
use crate::products::{ProductDraft, SizeDraft};

/// Client for an admin session against the hosted backend.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    /// Project root, with a trailing slash so API paths join onto it.
    base: Url,
    anon_key: String,
    bucket: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct ProfileRow {
    #[serde(default)]
    is_admin: Option<bool>,
}

impl AdminClient {
    /// Create a new admin client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured backend URL cannot hold API paths.
    pub fn new(config: &AdminConfig) -> std::result::Result<Self, url::ParseError> {
        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                base: Url::parse(&config.endpoint(""))?,
                anon_key: config.anon_key.expose_secret().to_string(),
                bucket: config.storage_bucket.clone(),
            }),
        })
    }

    /// Public URL of a stored object.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be joined onto the project URL.
    pub fn public_url(&self, path: &str) -> Result<String> {
        let url = self
            .inner
            .base
            .join(&format!("storage/v1/object/public/{}/{path}", self.inner.bucket))?;
        Ok(url.to_string())
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.inner.base.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Start a request. Calls without a session use the anon key as bearer.
    fn request(&self, method: Method, url: Url, session: Option<&Session>) -> RequestBuilder {
        let token = session.map_or(self.inner.anon_key.as_str(), |s| {
            s.access_token.expose_secret()
        });
        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token)
    }

    /// Send a request and return the body of a success response.
    async fn execute(&self, request: RequestBuilder, operation: &str) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                operation,
                "Backend returned non-success status"
            );
            return Err(AdminError::Backend {
                status: status.as_u16(),
                message: error_message(&response_text),
            });
        }

        debug!(operation, "Backend request succeeded");
        Ok(response_text)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T> {
        let body = self.execute(request, operation).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                operation,
                "Failed to parse backend response"
            );
            AdminError::Parse(e)
        })
    }

    async fn write_product(
        &self,
        request: RequestBuilder,
        draft: &ProductDraft,
        image: Option<&StoredImage>,
        operation: &str,
    ) -> Result<Product> {
        let mut payload = serde_json::to_value(draft)?;
        if let (Some(image), Some(fields)) = (image, payload.as_object_mut()) {
            fields.insert("image_path".to_string(), json!(image.path));
            fields.insert("image_url".to_string(), json!(image.public_url));
        }

        let rows: Vec<Product> = self
            .execute_json(
                request
                    .header("Prefer", "return=representation")
                    .json(&payload),
                operation,
            )
            .await?;
        rows.into_iter().next().ok_or_else(|| AdminError::Backend {
            status: 404,
            message: "product not found".to_string(),
        })
    }
}

#[async_trait]
impl AdminBackend for AdminClient {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session> {
        let url = self.url("auth/v1/token", &[("grant_type", "password")])?;
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "email": email, "password": password.expose_secret() }));

        let token: TokenResponse = match self.execute_json(request, "sign_in").await {
            Ok(token) => token,
            Err(AdminError::Backend { message, .. }) => return Err(AdminError::Auth(message)),
            Err(e) => return Err(e),
        };

        Ok(Session {
            access_token: SecretString::from(token.access_token),
            user_id: token.user.id,
            email: token.user.email,
        })
    }

    #[instrument(skip(self))]
    async fn is_admin(&self, session: &Session) -> Result<bool> {
        let user_filter = format!("eq.{}", session.user_id);
        let url = self.url(
            "rest/v1/profiles",
            &[("select", "is_admin"), ("user_id", &user_filter)],
        )?;
        let rows: Vec<ProfileRow> = self
            .execute_json(self.request(Method::GET, url, Some(session)), "is_admin")
            .await?;
        Ok(rows.first().and_then(|r| r.is_admin).unwrap_or(false))
    }

    #[instrument(skip(self))]
    async fn sign_out(&self, session: &Session) -> Result<()> {
        let url = self.url("auth/v1/logout", &[])?;
        self.execute(self.request(Method::POST, url, Some(session)), "sign_out")
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_products(&self, session: &Session) -> Result<Vec<Product>> {
        let url = self.url(
            "rest/v1/products",
            &[("select", PRODUCT_COLUMNS), ("order", "created_at.desc")],
        )?;
        self.execute_json(self.request(Method::GET, url, Some(session)), "fetch_products")
            .await
    }

    #[instrument(skip(self))]
    async fn fetch_size_variants(&self, session: &Session) -> Result<Vec<SizeVariant>> {
        let url = self.url("rest/v1/product_sizes", &[("select", SIZE_COLUMNS)])?;
        self.execute_json(
            self.request(Method::GET, url, Some(session)),
            "fetch_size_variants",
        )
        .await
    }

    #[instrument(skip(self, draft, image), fields(name = %draft.name))]
    async fn insert_product(
        &self,
        session: &Session,
        draft: &ProductDraft,
        image: Option<&StoredImage>,
    ) -> Result<Product> {
        let url = self.url("rest/v1/products", &[])?;
        self.write_product(
            self.request(Method::POST, url, Some(session)),
            draft,
            image,
            "insert_product",
        )
        .await
    }

    #[instrument(skip(self, draft, image))]
    async fn update_product(
        &self,
        session: &Session,
        id: &ProductId,
        draft: &ProductDraft,
        image: Option<&StoredImage>,
    ) -> Result<Product> {
        let id_filter = format!("eq.{id}");
        let url = self.url("rest/v1/products", &[("id", &id_filter)])?;
        self.write_product(
            self.request(Method::PATCH, url, Some(session)),
            draft,
            image,
            "update_product",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, session: &Session, id: &ProductId) -> Result<()> {
        let id_filter = format!("eq.{id}");
        let url = self.url("rest/v1/products", &[("id", &id_filter)])?;
        self.execute(
            self.request(Method::DELETE, url, Some(session)),
            "delete_product",
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, sizes), fields(count = sizes.len()))]
    async fn replace_size_variants(
        &self,
        session: &Session,
        product_id: &ProductId,
        sizes: &[SizeDraft],
    ) -> Result<Vec<SizeVariant>> {
        let product_filter = format!("eq.{product_id}");
        let url = self.url("rest/v1/product_sizes", &[("product_id", &product_filter)])?;
        self.execute(
            self.request(Method::DELETE, url, Some(session)),
            "delete_sizes",
        )
        .await?;

        if sizes.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<_> = sizes
            .iter()
            .map(|s| {
                json!({
                    "product_id": product_id,
                    "label": s.label,
                    "extra_price": s.extra_price.max(0),
                })
            })
            .collect();
        let url = self.url("rest/v1/product_sizes", &[])?;
        self.execute_json(
            self.request(Method::POST, url, Some(session))
                .header("Prefer", "return=representation")
                .json(&rows),
            "insert_sizes",
        )
        .await
    }

    #[instrument(skip(self, image), fields(bytes = image.bytes.len()))]
    async fn upload_image(
        &self,
        session: &Session,
        path: &str,
        image: &ImageUpload,
    ) -> Result<StoredImage> {
        let url = self.url(
            &format!("storage/v1/object/{}/{path}", self.inner.bucket),
            &[],
        )?;
        let request = self
            .request(Method::POST, url, Some(session))
            .header("Content-Type", &image.content_type)
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", "false")
            .body(image.bytes.clone());
        self.execute(request, "upload_image").await?;

        Ok(StoredImage {
            path: path.to_string(),
            public_url: self.public_url(path)?,
        })
    }

    #[instrument(skip(self))]
    async fn remove_image(&self, session: &Session, path: &str) -> Result<()> {
        let url = self.url(&format!("storage/v1/object/{}", self.inner.bucket), &[])?;
        self.execute(
            self.request(Method::DELETE, url, Some(session))
                .json(&json!({ "prefixes": [path] })),
            "remove_image",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> AdminClient {
        let config = AdminConfig {
            backend_url: Url::parse("https://abc.supabase.co").unwrap(),
            anon_key: SecretString::from("anon"),
            storage_bucket: "product-images".to_string(),
        };
        AdminClient::new(&config).unwrap()
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            client().public_url("2025/id-anillo.webp").unwrap(),
            "https://abc.supabase.co/storage/v1/object/public/product-images/2025/id-anillo.webp"
        );
    }

    #[test]
    fn test_url_with_filters() {
        let url = client()
            .url("rest/v1/products", &[("id", "eq.p1")])
            .unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/products?id=eq.p1");

        let url = client().url("auth/v1/logout", &[]).unwrap();
        assert_eq!(url.query(), None);
    }
}
