//! In-memory catalog built from the product and size rows fetched from the
//! backend.
//!
//! The index is immutable: every catalog refresh builds a new one and the
//! caller swaps it in wholesale.

use std::collections::HashMap;

use crate::types::{PriceBreakdown, Product, ProductId, SizeId, SizeVariant};

/// Products and their size variants, joined by product id.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    products: Vec<Product>,
    product_positions: HashMap<ProductId, usize>,
    variants_by_product: HashMap<ProductId, Vec<SizeVariant>>,
    variants_by_id: HashMap<SizeId, SizeVariant>,
}

impl CatalogIndex {
    /// Build an index from flat product and size sequences.
    ///
    /// Each product's variants are ordered by ascending `extra_price`; equal
    /// surcharges keep their fetch order. Sizes pointing at unknown products
    /// are still indexed by id.
    #[must_use]
    pub fn build(products: Vec<Product>, variants: Vec<SizeVariant>) -> Self {
        let product_positions = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        let mut variants_by_product: HashMap<ProductId, Vec<SizeVariant>> = HashMap::new();
        let mut variants_by_id = HashMap::with_capacity(variants.len());
        for variant in variants {
            variants_by_id
                .entry(variant.id.clone())
                .or_insert_with(|| variant.clone());
            variants_by_product
                .entry(variant.product_id.clone())
                .or_default()
                .push(variant);
        }
        for list in variants_by_product.values_mut() {
            // `sort_by_key` is stable, preserving fetch order for ties.
            list.sort_by_key(|v| v.extra_price);
        }

        Self {
            products,
            product_positions,
            variants_by_product,
            variants_by_id,
        }
    }

    /// An index with no products.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// All products in fetch order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by id.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.product_positions
            .get(id)
            .and_then(|&i| self.products.get(i))
    }

    /// Stored variants for a product, cheapest first. Empty if none are known.
    #[must_use]
    pub fn variants_for(&self, product_id: &ProductId) -> &[SizeVariant] {
        self.variants_by_product
            .get(product_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Variants offered for selection: the stored ones, or the synthesized
    /// "Única" variant when the product has none.
    #[must_use]
    pub fn variants_or_default(&self, product_id: &ProductId) -> Vec<SizeVariant> {
        let stored = self.variants_for(product_id);
        if stored.is_empty() {
            vec![SizeVariant::default_for(product_id.clone())]
        } else {
            stored.to_vec()
        }
    }

    /// Look up a stored variant by id.
    #[must_use]
    pub fn variant_by_id(&self, size_id: &SizeId) -> Option<&SizeVariant> {
        self.variants_by_id.get(size_id)
    }

    /// A stored variant of `product_id`. Sizes of other products don't match.
    #[must_use]
    pub fn variant_of(&self, product_id: &ProductId, size_id: &SizeId) -> Option<&SizeVariant> {
        self.variants_for(product_id).iter().find(|v| &v.id == size_id)
    }

    /// Surcharge of a product's size, or `0` when the product has no such size.
    #[must_use]
    pub fn extra_for(&self, product_id: &ProductId, size_id: &SizeId) -> i64 {
        self.variant_of(product_id, size_id).map_or(0, |v| v.extra_price)
    }

    /// The "from" price shown on listing cards: the product price with its
    /// cheapest variant's surcharge.
    #[must_use]
    pub fn from_price(&self, product: &Product) -> PriceBreakdown {
        let min_extra = self
            .variants_for(&product.id)
            .first()
            .map_or(0, |v| v.extra_price);
        product.price_with(min_extra)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::types::{Product, ProductId, SizeId, SizeVariant};

    pub fn product(id: &str, name: &str, base_price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            category: "manillas".to_owned(),
            description: String::new(),
            base_price,
            discount_percent: 0,
            featured: false,
            colors: Vec::new(),
            image_url: None,
            image_path: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn at_day(day: u32) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).single()
    }

    pub fn size(id: &str, product_id: &str, label: &str, extra_price: i64) -> SizeVariant {
        SizeVariant {
            id: SizeId::new(id),
            product_id: ProductId::new(product_id),
            label: label.to_owned(),
            extra_price,
        }
    }
}
