//! In-memory backend for tests and offline use.
//!
//! Writes require a signed-in admin, mirroring the hosted row-level
//! security policies. Any operation can be made to fail with [`MemoryBackend::fail`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use lumina_core::{Product, ProductId, SizeId, SizeVariant};
use secrecy::{ExposeSecret, SecretString};

use super::{AdminBackend, ImageUpload, Session, StoredImage};
use crate::error::{AdminError, Result};
use crate::products::{ProductDraft, SizeDraft};

/// Shared in-memory backend. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<MemoryUser>,
    products: Vec<Product>,
    sizes: Vec<SizeVariant>,
    objects: BTreeMap<String, usize>,
    failing: BTreeSet<String>,
    calls: Vec<String>,
    signed_out: Vec<String>,
    next_id: u64,
}

struct MemoryUser {
    id: String,
    email: String,
    password: String,
    is_admin: bool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user.
    #[must_use]
    pub fn with_user(self, email: &str, password: &str, is_admin: bool) -> Self {
        {
            let mut state = self.lock();
            let id = format!("user-{}", state.users.len() + 1);
            state.users.push(MemoryUser {
                id,
                email: email.to_string(),
                password: password.to_string(),
                is_admin,
            });
        }
        self
    }

    /// Seed products and sizes, as if already stored.
    #[must_use]
    pub fn with_catalog(self, products: Vec<Product>, sizes: Vec<SizeVariant>) -> Self {
        {
            let mut state = self.lock();
            state.products = products;
            state.sizes = sizes;
        }
        self
    }

    /// Make `operation` (a trait method name) fail until [`Self::recover`].
    pub fn fail(&self, operation: &str) {
        self.lock().failing.insert(operation.to_string());
    }

    pub fn recover(&self, operation: &str) {
        self.lock().failing.remove(operation);
    }

    /// Names of the operations called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    #[must_use]
    pub fn sizes_of(&self, product_id: &ProductId) -> Vec<SizeVariant> {
        self.lock()
            .sizes
            .iter()
            .filter(|s| &s.product_id == product_id)
            .cloned()
            .collect()
    }

    /// Paths of stored objects.
    #[must_use]
    pub fn object_paths(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    /// User ids that signed out.
    #[must_use]
    pub fn signed_out(&self) -> Vec<String> {
        self.lock().signed_out.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and fail it if requested.
    fn enter(&self, operation: &str) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        state.calls.push(operation.to_string());
        if state.failing.contains(operation) {
            return Err(AdminError::Backend {
                status: 500,
                message: format!("{operation} failed"),
            });
        }
        Ok(state)
    }

    /// Like [`Self::enter`], and the session must belong to an admin.
    fn enter_as_admin(
        &self,
        operation: &str,
        session: &Session,
    ) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self.enter(operation)?;
        let allowed = state
            .users
            .iter()
            .any(|u| u.id == session.user_id && u.is_admin);
        if !allowed {
            return Err(AdminError::Backend {
                status: 403,
                message: "permission denied".to_string(),
            });
        }
        Ok(state)
    }
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

fn apply(product: &mut Product, draft: &ProductDraft, image: Option<&StoredImage>) {
    product.name.clone_from(&draft.name);
    product.category.clone_from(&draft.category);
    product.description.clone_from(&draft.description);
    product.base_price = draft.base_price;
    product.discount_percent = draft.discount_percent;
    product.featured = draft.featured;
    product.colors.clone_from(&draft.colors);
    if let Some(image) = image {
        product.image_path = Some(image.path.clone());
        product.image_url = Some(image.public_url.clone());
    }
    product.updated_at = Some(Utc::now());
}

#[async_trait]
impl AdminBackend for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session> {
        let state = self.enter("sign_in")?;
        state
            .users
            .iter()
            .find(|u| u.email == email && u.password == password.expose_secret())
            .map(|u| Session {
                access_token: SecretString::from(format!("token-{}", u.id)),
                user_id: u.id.clone(),
                email: Some(u.email.clone()),
            })
            .ok_or_else(|| AdminError::Auth("Invalid login credentials".to_string()))
    }

    async fn is_admin(&self, session: &Session) -> Result<bool> {
        let state = self.enter("is_admin")?;
        Ok(state
            .users
            .iter()
            .any(|u| u.id == session.user_id && u.is_admin))
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        let mut state = self.enter("sign_out")?;
        state.signed_out.push(session.user_id.clone());
        Ok(())
    }

    async fn fetch_products(&self, _session: &Session) -> Result<Vec<Product>> {
        let state = self.enter("fetch_products")?;
        Ok(state.products.clone())
    }

    async fn fetch_size_variants(&self, _session: &Session) -> Result<Vec<SizeVariant>> {
        let state = self.enter("fetch_size_variants")?;
        Ok(state.sizes.clone())
    }

    async fn insert_product(
        &self,
        session: &Session,
        draft: &ProductDraft,
        image: Option<&StoredImage>,
    ) -> Result<Product> {
        let mut state = self.enter_as_admin("insert_product", session)?;
        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(state.next_id("p")),
            name: String::new(),
            category: String::new(),
            description: String::new(),
            base_price: 0,
            discount_percent: 0,
            featured: false,
            colors: Vec::new(),
            image_url: None,
            image_path: None,
            created_at: Some(now),
            updated_at: None,
        };
        apply(&mut product, draft, image);
        state.products.insert(0, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        session: &Session,
        id: &ProductId,
        draft: &ProductDraft,
        image: Option<&StoredImage>,
    ) -> Result<Product> {
        let mut state = self.enter_as_admin("update_product", session)?;
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| AdminError::Backend {
                status: 404,
                message: "product not found".to_string(),
            })?;
        apply(product, draft, image);
        Ok(product.clone())
    }

    async fn delete_product(&self, session: &Session, id: &ProductId) -> Result<()> {
        let mut state = self.enter_as_admin("delete_product", session)?;
        state.products.retain(|p| &p.id != id);
        state.sizes.retain(|s| &s.product_id != id);
        Ok(())
    }

    async fn replace_size_variants(
        &self,
        session: &Session,
        product_id: &ProductId,
        sizes: &[SizeDraft],
    ) -> Result<Vec<SizeVariant>> {
        let mut state = self.enter_as_admin("replace_size_variants", session)?;
        state.sizes.retain(|s| &s.product_id != product_id);
        let mut inserted = Vec::with_capacity(sizes.len());
        for size in sizes {
            let variant = SizeVariant {
                id: SizeId::new(state.next_id("s")),
                product_id: product_id.clone(),
                label: size.label.clone(),
                extra_price: size.extra_price.max(0),
            };
            state.sizes.push(variant.clone());
            inserted.push(variant);
        }
        Ok(inserted)
    }

    async fn upload_image(
        &self,
        session: &Session,
        path: &str,
        image: &ImageUpload,
    ) -> Result<StoredImage> {
        let mut state = self.enter_as_admin("upload_image", session)?;
        if state.objects.contains_key(path) {
            return Err(AdminError::Backend {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }
        state.objects.insert(path.to_string(), image.bytes.len());
        Ok(StoredImage {
            path: path.to_string(),
            public_url: format!("memory://product-images/{path}"),
        })
    }

    async fn remove_image(&self, session: &Session, path: &str) -> Result<()> {
        let mut state = self.enter_as_admin("remove_image", session)?;
        state.objects.remove(path);
        Ok(())
    }
}
