//! The storefront context object.
//!
//! [`Shop`] owns everything the storefront UI reads and mutates: the current
//! [`CatalogIndex`], the [`CartStore`] and the [`ShippingPolicy`]. The catalog
//! is only ever replaced wholesale.

use serde::Serialize;
use thiserror::Error;

use crate::cart::{CartKey, CartLine, CartRepository, CartSelection, CartStore, CartStoreError};
use crate::catalog::CatalogIndex;
use crate::checkout::{CartView, CheckoutTotals, ShippingPolicy, cart_view};
use crate::listing::{
    ListingEntry, ListingFilters, ProductDetail, SortKey, listing_view, product_detail,
};
use crate::types::{ProductId, SizeId};

/// Errors raised by storefront operations.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("size {size_id} not offered for product {product_id}")]
    SizeNotFound {
        product_id: ProductId,
        size_id: SizeId,
    },

    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Cart(#[from] CartStoreError),
}

/// Result of a simulated checkout. No order is placed and the cart is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub simulated: bool,
    pub item_count: u32,
    #[serde(flatten)]
    pub totals: CheckoutTotals,
}

#[derive(Debug)]
pub struct Shop<R> {
    catalog: CatalogIndex,
    cart: CartStore<R>,
    shipping: ShippingPolicy,
}

impl<R: CartRepository> Shop<R> {
    /// A shop with an empty catalog.
    pub fn new(repository: R, shipping: ShippingPolicy) -> Self {
        Self {
            catalog: CatalogIndex::empty(),
            cart: CartStore::new(repository),
            shipping,
        }
    }

    pub const fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub const fn cart(&self) -> &CartStore<R> {
        &self.cart
    }

    pub const fn shipping(&self) -> &ShippingPolicy {
        &self.shipping
    }

    /// Swap in a freshly built catalog.
    pub fn replace_catalog(&mut self, catalog: CatalogIndex) {
        self.catalog = catalog;
    }

    pub fn listing_view(&self, filters: &ListingFilters, sort: SortKey) -> Vec<ListingEntry> {
        listing_view(&self.catalog, filters, sort)
    }

    pub fn product_detail(&self, product_id: &ProductId) -> Option<ProductDetail> {
        product_detail(&self.catalog, product_id)
    }

    pub fn cart_view(&self) -> CartView {
        cart_view(&self.cart.lines(), &self.catalog, &self.shipping)
    }

    pub fn cart_count(&self) -> u32 {
        self.cart.total_item_count()
    }

    /// Add a selection to the cart. The size must be one the product offers;
    /// a missing size label is filled in from the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::ProductNotFound`] if the product is not in the
    /// catalog, [`ShopError::SizeNotFound`] if the product has no such size,
    /// or a cart error if the cart cannot be saved.
    pub fn add_to_cart(
        &mut self,
        mut selection: CartSelection,
        qty: Option<i64>,
    ) -> Result<CartLine, ShopError> {
        if self.catalog.product(&selection.product_id).is_none() {
            return Err(ShopError::ProductNotFound(selection.product_id));
        }
        if selection.size_id.is_empty() {
            selection.size_id = SizeId::default_size();
        }

        let Some(variant) = self
            .catalog
            .variants_or_default(&selection.product_id)
            .into_iter()
            .find(|v| v.id == selection.size_id)
        else {
            return Err(ShopError::SizeNotFound {
                product_id: selection.product_id,
                size_id: selection.size_id,
            });
        };
        if selection.size_label.trim().is_empty() {
            selection.size_label = variant.label;
        }

        Ok(self.cart.add(selection, qty)?)
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn set_cart_quantity(
        &mut self,
        key: &CartKey,
        qty: i64,
    ) -> Result<Option<CartLine>, ShopError> {
        Ok(self.cart.set_quantity(key, qty)?)
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn remove_from_cart(&mut self, key: &CartKey) -> Result<bool, ShopError> {
        Ok(self.cart.remove(key)?)
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn clear_cart(&mut self) -> Result<(), ShopError> {
        Ok(self.cart.clear()?)
    }

    /// Simulate a checkout of the current cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::EmptyCart`] if nothing in the cart can be priced.
    pub fn checkout(&self) -> Result<CheckoutReceipt, ShopError> {
        let view = self.cart_view();
        if view.lines.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        tracing::info!(
            item_count = view.item_count,
            total = view.total,
            "Simulated checkout"
        );

        Ok(CheckoutReceipt {
            simulated: true,
            item_count: view.item_count,
            totals: view.totals(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::MemoryCartRepository;
    use crate::catalog::fixtures::{product, size};

    fn shop() -> Shop<MemoryCartRepository> {
        let mut shop = Shop::new(MemoryCartRepository::new(), ShippingPolicy::default());
        shop.replace_catalog(CatalogIndex::build(
            vec![
                product("p1", "Manilla Luna", 30_000),
                product("p2", "Collar Sol", 80_000),
            ],
            vec![size("s-m", "p2", "45cm", 4_000)],
        ));
        shop
    }

    fn pick(product_id: &str, size_id: &str) -> CartSelection {
        CartSelection {
            product_id: ProductId::new(product_id),
            size_id: SizeId::new(size_id),
            size_label: String::new(),
            color: "Dorado".into(),
        }
    }

    #[test]
    fn test_add_unknown_product_is_rejected() {
        let mut shop = shop();
        let err = shop.add_to_cart(pick("nope", "na"), None).unwrap_err();
        assert!(matches!(err, ShopError::ProductNotFound(id) if id.as_str() == "nope"));
        assert_eq!(shop.cart_count(), 0);
    }

    #[test]
    fn test_add_fills_size_label_from_catalog() {
        let mut shop = shop();
        let line = shop.add_to_cart(pick("p2", "s-m"), None).unwrap();
        assert_eq!(line.size_label, "45cm");

        let line = shop.add_to_cart(pick("p1", "na"), None).unwrap();
        assert_eq!(line.size_label, crate::types::DEFAULT_SIZE_LABEL);
    }

    #[test]
    fn test_add_rejects_size_of_another_product() {
        let mut shop = shop();
        let err = shop.add_to_cart(pick("p1", "s-m"), None).unwrap_err();
        assert!(matches!(
            err,
            ShopError::SizeNotFound { ref product_id, ref size_id }
                if product_id.as_str() == "p1" && size_id.as_str() == "s-m"
        ));
        assert_eq!(shop.cart_count(), 0);
        assert_eq!(shop.cart_view().subtotal, 0);
    }

    #[test]
    fn test_add_rejects_unknown_size() {
        let mut shop = shop();
        assert!(matches!(
            shop.add_to_cart(pick("p1", "bogus"), None),
            Err(ShopError::SizeNotFound { .. })
        ));
        // p2 has stored sizes, so the default size is not on offer.
        assert!(matches!(
            shop.add_to_cart(pick("p2", "na"), None),
            Err(ShopError::SizeNotFound { .. })
        ));
        assert_eq!(shop.cart_count(), 0);
    }

    #[test]
    fn test_empty_size_id_means_default_size() {
        let mut shop = shop();
        let line = shop.add_to_cart(pick("p1", ""), None).unwrap();
        assert!(line.size_id.is_default());
        assert_eq!(line.size_label, crate::types::DEFAULT_SIZE_LABEL);
    }

    #[test]
    fn test_cart_view_through_shop() {
        let mut shop = shop();
        shop.add_to_cart(pick("p2", "s-m"), Some(2)).unwrap();
        let view = shop.cart_view();
        assert_eq!(view.subtotal, 168_000);
        assert_eq!(view.shipping, 0);
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_replace_catalog_marks_removed_products_stale() {
        let mut shop = shop();
        shop.add_to_cart(pick("p1", "na"), None).unwrap();
        shop.replace_catalog(CatalogIndex::build(
            vec![product("p2", "Collar Sol", 80_000)],
            Vec::new(),
        ));

        let view = shop.cart_view();
        assert!(view.lines.is_empty());
        assert_eq!(view.stale.len(), 1);
        assert_eq!(shop.cart_count(), 1);
        assert!(matches!(shop.checkout(), Err(ShopError::EmptyCart)));
    }

    #[test]
    fn test_quantity_and_removal() {
        let mut shop = shop();
        let key = shop.add_to_cart(pick("p1", "na"), None).unwrap().key();
        let line = shop.set_cart_quantity(&key, 7).unwrap().unwrap();
        assert_eq!(line.qty, 7);
        assert!(shop.remove_from_cart(&key).unwrap());
        assert_eq!(shop.cart_count(), 0);
    }

    #[test]
    fn test_checkout_rejects_empty_cart() {
        let shop = shop();
        assert!(matches!(shop.checkout(), Err(ShopError::EmptyCart)));
    }

    #[test]
    fn test_checkout_keeps_cart() {
        let mut shop = shop();
        shop.add_to_cart(pick("p1", "na"), Some(2)).unwrap();
        let receipt = shop.checkout().unwrap();
        assert!(receipt.simulated);
        assert_eq!(receipt.item_count, 2);
        assert_eq!(receipt.totals.subtotal, 60_000);
        assert_eq!(receipt.totals.shipping, 12_000);
        assert_eq!(receipt.totals.total, 72_000);
        assert_eq!(shop.cart_count(), 2);

        shop.clear_cart().unwrap();
        assert_eq!(shop.cart_count(), 0);
    }

    #[test]
    fn test_listing_and_detail_through_shop() {
        let shop = shop();
        let view = shop.listing_view(&ListingFilters::default(), SortKey::PriceAsc);
        assert_eq!(view[0].product.id.as_str(), "p1");
        assert_eq!(view[1].from_price_final, 84_000);

        let detail = shop.product_detail(&ProductId::new("p2")).unwrap();
        assert_eq!(detail.sizes.len(), 1);
        assert_eq!(detail.sizes[0].price.final_price, 84_000);
    }
}
