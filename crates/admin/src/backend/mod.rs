//! Authenticated access to the hosted backend.
//!
//! [`AdminBackend`] is the port the console depends on. [`AdminClient`]
//! implements it over the backend's auth, REST and storage APIs.

mod client;
mod memory;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use lumina_core::{Product, ProductId, SizeVariant};
use secrecy::SecretString;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::products::{ProductDraft, SizeDraft};

pub use client::AdminClient;
pub use memory::MemoryBackend;

/// A signed-in user.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub user_id: String,
    pub email: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

/// An image to store.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Object path for a new upload: `<year>/<uuid>-<filename>`.
    #[must_use]
    pub fn object_path(&self) -> String {
        object_path(Utc::now().year(), Uuid::new_v4(), &self.filename)
    }
}

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredImage {
    pub path: String,
    pub public_url: String,
}

/// Operations the admin console performs against the backend.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// Password sign-in.
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session>;

    /// Whether the user's profile carries the admin flag.
    async fn is_admin(&self, session: &Session) -> Result<bool>;

    /// End the session.
    async fn sign_out(&self, session: &Session) -> Result<()>;

    /// All products, newest first.
    async fn fetch_products(&self, session: &Session) -> Result<Vec<Product>>;

    /// All size variants of all products.
    async fn fetch_size_variants(&self, session: &Session) -> Result<Vec<SizeVariant>>;

    /// Insert a product row. `image` fills the image columns.
    async fn insert_product(
        &self,
        session: &Session,
        draft: &ProductDraft,
        image: Option<&StoredImage>,
    ) -> Result<Product>;

    /// Update a product row. Image columns are left alone when `image` is `None`.
    async fn update_product(
        &self,
        session: &Session,
        id: &ProductId,
        draft: &ProductDraft,
        image: Option<&StoredImage>,
    ) -> Result<Product>;

    /// Delete a product row. Its sizes cascade.
    async fn delete_product(&self, session: &Session, id: &ProductId) -> Result<()>;

    /// Replace every size of a product: delete all, then insert `sizes`.
    async fn replace_size_variants(
        &self,
        session: &Session,
        product_id: &ProductId,
        sizes: &[SizeDraft],
    ) -> Result<Vec<SizeVariant>>;

    /// Store an image at `path`.
    async fn upload_image(
        &self,
        session: &Session,
        path: &str,
        image: &ImageUpload,
    ) -> Result<StoredImage>;

    /// Remove a stored image.
    async fn remove_image(&self, session: &Session, path: &str) -> Result<()>;
}

/// Object path for an upload. Only the last component of `filename` is kept.
#[must_use]
pub fn object_path(year: i32, id: Uuid, filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("product.webp");
    format!("{year}/{id}-{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path() {
        let id = Uuid::nil();
        assert_eq!(
            object_path(2025, id, "anillo.webp"),
            "2025/00000000-0000-0000-0000-000000000000-anillo.webp"
        );
        assert!(object_path(2025, id, "../../etc/x.png").ends_with("-x.png"));
        assert!(object_path(2025, id, "").ends_with("-product.webp"));
    }

    #[test]
    fn test_upload_path_has_year_prefix() {
        let image = ImageUpload {
            filename: "foto.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1, 2, 3],
        };
        let path = image.object_path();
        assert!(path.starts_with(&format!("{}/", Utc::now().year())));
        assert!(path.ends_with("-foto.jpg"));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session {
            access_token: SecretString::from("jwt-token"),
            user_id: "u1".to_string(),
            email: None,
        };
        assert!(!format!("{session:?}").contains("jwt-token"));
    }
}
