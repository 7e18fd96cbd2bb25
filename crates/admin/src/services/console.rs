//! The admin console: a signed-in admin session plus its view of the catalog.

use lumina_core::catalog::CatalogIndex;
use lumina_core::{PriceBreakdown, Product, ProductId};
use secrecy::SecretString;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::backend::{AdminBackend, ImageUpload, Session, StoredImage};
use crate::error::{AdminError, Result};
use crate::products::ProductForm;

/// One row of the admin product list.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub featured: bool,
    pub discount_percent: i64,
    pub size_count: usize,
    pub image_url: Option<String>,
    /// Cheapest size, after discount.
    pub from_price: PriceBreakdown,
}

/// Outcome of a catalog refetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub products: usize,
    pub size_variants: usize,
    /// Set when sizes could not be read; products were installed without them.
    pub sizes_error: Option<String>,
}

/// An authenticated admin session.
///
/// The local catalog is only replaced after a successful refetch, so a
/// failed write never shows up here as a half-applied change.
pub struct AdminConsole<B> {
    backend: B,
    session: Session,
    catalog: CatalogIndex,
}

impl<B: AdminBackend> AdminConsole<B> {
    /// Sign in and verify the user is an admin, then load the catalog.
    ///
    /// A non-admin (or a failed admin check) is signed out again. A failed
    /// initial load leaves the catalog empty and is logged.
    ///
    /// # Errors
    ///
    /// Returns `Auth` for missing or rejected credentials, `PermissionDenied`
    /// for non-admins, or the admin check's own error.
    #[instrument(skip(backend, password))]
    pub async fn connect(backend: B, email: &str, password: &SecretString) -> Result<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AdminError::Auth("email is required".to_string()));
        }

        let session = backend.sign_in(email, password).await?;

        let is_admin = backend.is_admin(&session).await;
        if !matches!(is_admin, Ok(true)) {
            if let Err(e) = backend.sign_out(&session).await {
                warn!(error = %e, "Sign-out after failed admin check failed");
            }
            return Err(is_admin.err().unwrap_or_else(|| {
                AdminError::PermissionDenied(format!("{email} is not an admin"))
            }));
        }
        info!(user_id = %session.user_id, "Admin signed in");

        let mut console = Self {
            backend,
            session,
            catalog: CatalogIndex::empty(),
        };
        if let Err(e) = console.refresh().await {
            warn!(error = %e, "Initial catalog load failed");
        }
        Ok(console)
    }

    /// The session's user.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The last successfully fetched catalog.
    #[must_use]
    pub const fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    /// Product list, newest first, with "from" prices.
    #[must_use]
    pub fn product_rows(&self) -> Vec<ProductRow> {
        self.catalog
            .products()
            .iter()
            .map(|p| ProductRow {
                id: p.id.clone(),
                name: p.name.clone(),
                category: p.category.clone(),
                featured: p.featured,
                discount_percent: p.discount(),
                size_count: self.catalog.variants_for(&p.id).len(),
                image_url: p.image_url.clone(),
                from_price: self.catalog.from_price(p),
            })
            .collect()
    }

    /// Refetch products and sizes.
    ///
    /// # Errors
    ///
    /// Returns the products error; the previous catalog stays in place.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<RefreshOutcome> {
        let products = self.backend.fetch_products(&self.session).await?;
        let (variants, sizes_error) = match self.backend.fetch_size_variants(&self.session).await
        {
            Ok(variants) => (variants, None),
            Err(e) => {
                warn!(error = %e, "Size fetch failed, using default sizes");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let outcome = RefreshOutcome {
            products: products.len(),
            size_variants: variants.len(),
            sizes_error,
        };
        self.catalog = CatalogIndex::build(products, variants);
        Ok(outcome)
    }

    /// Create (`id == None`) or update a product.
    ///
    /// Order: upload the new image, write the row, replace its sizes, then
    /// refetch. The previous stored image is removed best-effort after a
    /// successful upload. A failed refetch is logged; the write stands.
    ///
    /// # Errors
    ///
    /// Returns `Validation` before any backend call, otherwise the first
    /// failing write.
    #[instrument(skip(self, form, image), fields(has_image = image.is_some()))]
    pub async fn save_product(
        &mut self,
        id: Option<&ProductId>,
        form: &ProductForm,
        image: Option<ImageUpload>,
    ) -> Result<Product> {
        let draft = form.parse()?;
        let previous_image = id
            .and_then(|id| self.catalog.product(id))
            .and_then(|p| p.image_path.clone());

        let stored = match image {
            Some(image) => Some(self.store_image(&image, previous_image.as_deref()).await?),
            None => None,
        };

        let saved = match id {
            Some(id) => {
                self.backend
                    .update_product(&self.session, id, &draft, stored.as_ref())
                    .await?
            }
            None => {
                self.backend
                    .insert_product(&self.session, &draft, stored.as_ref())
                    .await?
            }
        };

        self.backend
            .replace_size_variants(&self.session, &saved.id, &draft.sizes)
            .await?;
        info!(product_id = %saved.id, sizes = draft.sizes.len(), "Product saved");

        self.refresh_after_write().await;
        Ok(saved)
    }

    /// Delete a product. Its stored image is removed best-effort first.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the row could not be deleted.
    #[instrument(skip(self))]
    pub async fn delete_product(&mut self, id: &ProductId) -> Result<()> {
        let image_path = self.catalog.product(id).and_then(|p| p.image_path.clone());
        if let Some(path) = image_path {
            self.remove_image_best_effort(&path).await;
        }

        self.backend.delete_product(&self.session, id).await?;
        info!(product_id = %id, "Product deleted");

        self.refresh_after_write().await;
        Ok(())
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns the backend error if sign-out failed.
    pub async fn sign_out(self) -> Result<()> {
        self.backend.sign_out(&self.session).await
    }

    async fn store_image(
        &self,
        image: &ImageUpload,
        previous: Option<&str>,
    ) -> Result<StoredImage> {
        let path = image.object_path();
        let stored = self
            .backend
            .upload_image(&self.session, &path, image)
            .await?;
        if let Some(previous) = previous {
            self.remove_image_best_effort(previous).await;
        }
        Ok(stored)
    }

    async fn remove_image_best_effort(&self, path: &str) {
        if let Err(e) = self.backend.remove_image(&self.session, path).await {
            warn!(error = %e, path, "Failed to remove stored image");
        }
    }

    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Catalog refetch after write failed, keeping previous catalog");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    const EMAIL: &str = "admin@lumina.co";
    const PASSWORD: &str = "s3cret";

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_user(EMAIL, PASSWORD, true)
            .with_user("cliente@lumina.co", "cliente", false)
    }

    async fn connect(backend: &MemoryBackend) -> AdminConsole<MemoryBackend> {
        AdminConsole::connect(backend.clone(), EMAIL, &SecretString::from(PASSWORD))
            .await
            .unwrap()
    }

    fn form(name: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            category: "Anillos".to_string(),
            base_price: "50000".to_string(),
            discount: "20".to_string(),
            sizes: "6\n7, 5000".to_string(),
            ..ProductForm::default()
        }
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            filename: name.to_string(),
            content_type: "image/webp".to_string(),
            bytes: vec![0; 16],
        }
    }

    #[tokio::test]
    async fn test_non_admin_is_signed_out() {
        let backend = backend();
        let result = AdminConsole::connect(
            backend.clone(),
            "cliente@lumina.co",
            &SecretString::from("cliente"),
        )
        .await;

        assert!(matches!(result, Err(AdminError::PermissionDenied(_))));
        assert_eq!(backend.signed_out(), vec!["user-2".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_admin_check_signs_out() {
        let backend = backend();
        backend.fail("is_admin");
        let result =
            AdminConsole::connect(backend.clone(), EMAIL, &SecretString::from(PASSWORD)).await;

        assert!(matches!(result, Err(AdminError::Backend { .. })));
        assert_eq!(backend.signed_out().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let result =
            AdminConsole::connect(backend(), EMAIL, &SecretString::from("wrong")).await;
        assert!(matches!(result, Err(AdminError::Auth(_))));

        let result = AdminConsole::connect(backend(), "  ", &SecretString::from("x")).await;
        assert!(matches!(result, Err(AdminError::Auth(_))));
    }

    #[tokio::test]
    async fn test_create_product_with_sizes_and_image() {
        let backend = backend();
        let mut console = connect(&backend).await;

        let saved = console
            .save_product(None, &form("Anillo Sol"), Some(image("sol.webp")))
            .await
            .unwrap();

        assert_eq!(saved.category, "anillos");
        assert!(saved.image_path.as_deref().unwrap().ends_with("-sol.webp"));
        assert_eq!(backend.sizes_of(&saved.id).len(), 2);
        assert_eq!(backend.object_paths().len(), 1);

        let rows = console.product_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size_count, 2);
        assert_eq!(rows[0].from_price.pre_discount, 50_000);
        assert_eq!(rows[0].from_price.final_price, 40_000);
    }

    #[tokio::test]
    async fn test_update_replaces_image_and_sizes() {
        let backend = backend();
        let mut console = connect(&backend).await;
        let saved = console
            .save_product(None, &form("Anillo Sol"), Some(image("sol.webp")))
            .await
            .unwrap();
        let old_path = saved.image_path.clone().unwrap();

        let mut edit = form("Anillo Sol Dorado");
        edit.sizes = String::new();
        let updated = console
            .save_product(Some(&saved.id), &edit, Some(image("sol-2.webp")))
            .await
            .unwrap();

        assert_eq!(updated.name, "Anillo Sol Dorado");
        let paths = backend.object_paths();
        assert_eq!(paths.len(), 1);
        assert_ne!(paths[0], old_path);

        let sizes = backend.sizes_of(&saved.id);
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0].label, "Única");
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_it() {
        let backend = backend();
        let mut console = connect(&backend).await;
        let saved = console
            .save_product(None, &form("Anillo Sol"), Some(image("sol.webp")))
            .await
            .unwrap();

        let updated = console
            .save_product(Some(&saved.id), &form("Anillo Sol"), None)
            .await
            .unwrap();
        assert_eq!(updated.image_path, saved.image_path);
        assert_eq!(backend.object_paths().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_makes_no_backend_call() {
        let backend = backend();
        let mut console = connect(&backend).await;
        let before = backend.calls().len();

        let mut bad = form("Anillo");
        bad.base_price = "-10".to_string();
        let err = console.save_product(None, &bad, Some(image("x.webp"))).await;

        assert!(matches!(err, Err(AdminError::Validation(_))));
        assert_eq!(backend.calls().len(), before);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_local_catalog() {
        let backend = backend();
        let mut console = connect(&backend).await;
        console
            .save_product(None, &form("Anillo Sol"), None)
            .await
            .unwrap();

        backend.fail("insert_product");
        let err = console.save_product(None, &form("Anillo Luna"), None).await;

        assert!(matches!(err, Err(AdminError::Backend { status: 500, .. })));
        assert_eq!(console.catalog().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_catalog() {
        let backend = backend();
        let mut console = connect(&backend).await;
        console
            .save_product(None, &form("Anillo Sol"), None)
            .await
            .unwrap();

        backend.fail("fetch_products");
        console
            .save_product(None, &form("Anillo Luna"), None)
            .await
            .unwrap();

        assert_eq!(backend.products().len(), 2);
        assert_eq!(console.catalog().len(), 1);

        backend.recover("fetch_products");
        console.refresh().await.unwrap();
        assert_eq!(console.catalog().len(), 2);
    }

    #[tokio::test]
    async fn test_size_fetch_failure_uses_defaults() {
        let backend = backend();
        let mut console = connect(&backend).await;
        console
            .save_product(None, &form("Anillo Sol"), None)
            .await
            .unwrap();

        backend.fail("fetch_size_variants");
        let outcome = console.refresh().await.unwrap();

        assert_eq!(outcome.products, 1);
        assert!(outcome.sizes_error.is_some());
        assert_eq!(console.product_rows()[0].size_count, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_image_best_effort() {
        let backend = backend();
        let mut console = connect(&backend).await;
        let saved = console
            .save_product(None, &form("Anillo Sol"), Some(image("sol.webp")))
            .await
            .unwrap();

        backend.fail("remove_image");
        console.delete_product(&saved.id).await.unwrap();

        assert!(backend.products().is_empty());
        assert!(backend.sizes_of(&saved.id).is_empty());
        assert!(console.catalog().is_empty());
        assert_eq!(backend.object_paths().len(), 1);
    }
}
