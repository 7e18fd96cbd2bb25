//! Filter and sort pipeline for the product grid.
//!
//! [`query`] is a pure function of its inputs: the same products, filters
//! and sort key always yield the same order. Every sort is stable, so
//! products with equal keys keep their input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::catalog::CatalogIndex;
use crate::types::{PriceBreakdown, Product, ProductId, SizeId};

/// Predicates applied to the catalog, all AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    /// Case-insensitive substring matched against name, category or
    /// description. Empty matches everything.
    #[serde(default)]
    pub text: String,
    /// Exact category match. Empty means any category.
    #[serde(default)]
    pub category: String,
    /// Only featured products.
    #[serde(default)]
    pub featured_only: bool,
    /// Upper bound on the "from" price. `None` or non-finite means no bound.
    #[serde(default)]
    pub price_ceiling: Option<f64>,
}

impl ListingFilters {
    /// Whether a product passes every filter.
    #[must_use]
    pub fn matches(&self, product: &Product, catalog: &CatalogIndex) -> bool {
        let needle = self.text.trim().to_lowercase();
        if !needle.is_empty()
            && ![&product.name, &product.category, &product.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        {
            return false;
        }

        if !self.category.is_empty() && product.category != self.category {
            return false;
        }

        if self.featured_only && !product.featured {
            return false;
        }

        if let Some(ceiling) = self.price_ceiling.filter(|c| c.is_finite()) {
            #[allow(clippy::cast_precision_loss)] // catalog prices are far below 2^52
            let price = catalog.from_price(product).final_price as f64;
            if price > ceiling {
                return false;
            }
        }

        true
    }
}

/// Ordering of the product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Featured first, then newest first.
    #[default]
    FeaturedRecent,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    /// Parse a sort key, falling back to the default for unknown input.
    #[must_use]
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// The wire name of this sort key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FeaturedRecent => "featured_recent",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured_recent" => Ok(Self::FeaturedRecent),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

/// One card of the product grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    pub product: Product,
    pub from_price_final: i64,
    pub from_price_pre_discount: i64,
}

impl ListingEntry {
    fn new(product: &Product, price: PriceBreakdown) -> Self {
        Self {
            product: product.clone(),
            from_price_final: price.final_price,
            from_price_pre_discount: price.pre_discount,
        }
    }
}

/// Filter and sort `products`, returning references in display order.
#[must_use]
pub fn query<'a>(
    products: &'a [Product],
    catalog: &CatalogIndex,
    filters: &ListingFilters,
    sort: SortKey,
) -> Vec<&'a Product> {
    let mut view: Vec<(&Product, i64)> = products
        .iter()
        .filter(|p| filters.matches(p, catalog))
        .map(|p| (p, catalog.from_price(p).final_price))
        .collect();

    match sort {
        SortKey::FeaturedRecent => view.sort_by(|(a, _), (b, _)| {
            b.featured
                .cmp(&a.featured)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
        SortKey::PriceAsc => view.sort_by_key(|&(_, price)| price),
        SortKey::PriceDesc => view.sort_by(|(_, a), (_, b)| b.cmp(a)),
        SortKey::NameAsc => view.sort_by(|(a, _), (b, _)| collate(&a.name, &b.name)),
        SortKey::NameDesc => view.sort_by(|(a, _), (b, _)| collate(&b.name, &a.name)),
    }

    view.into_iter().map(|(p, _)| p).collect()
}

/// The product grid for the catalog: filtered, sorted and priced.
#[must_use]
pub fn listing_view(
    catalog: &CatalogIndex,
    filters: &ListingFilters,
    sort: SortKey,
) -> Vec<ListingEntry> {
    query(catalog.products(), catalog, filters, sort)
        .into_iter()
        .map(|p| ListingEntry::new(p, catalog.from_price(p)))
        .collect()
}

/// A size option on the product detail view, priced for that size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeOption {
    pub id: SizeId,
    pub label: String,
    pub extra_price: i64,
    pub price: PriceBreakdown,
}

/// Everything the product detail view needs to offer a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub sizes: Vec<SizeOption>,
    pub colors: Vec<String>,
}

/// Detail view for one product, with default size and color synthesized.
#[must_use]
pub fn product_detail(catalog: &CatalogIndex, product_id: &ProductId) -> Option<ProductDetail> {
    let product = catalog.product(product_id)?;
    let sizes = catalog
        .variants_or_default(product_id)
        .into_iter()
        .map(|v| SizeOption {
            price: product.price_with(v.extra_price),
            id: v.id,
            label: v.label,
            extra_price: v.extra_price,
        })
        .collect();

    Some(ProductDetail {
        product: product.clone(),
        sizes,
        colors: product.colors_or_default(),
    })
}

/// Compare two names the way a Spanish-speaking shopper expects.
///
/// Base letters decide first (`ñ` sits between `n` and `o`), then accents,
/// then case with lowercase first. Strings that are still equal fall back to
/// a plain code point comparison so the order is total.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    let (ka, kb) = (CollationKey::new(a), CollationKey::new(b));
    ka.primary
        .cmp(&kb.primary)
        .then_with(|| ka.secondary.cmp(&kb.secondary))
        .then_with(|| ka.tertiary.cmp(&kb.tertiary))
        .then_with(|| a.cmp(b))
}

struct CollationKey {
    primary: Vec<u32>,
    secondary: Vec<u8>,
    tertiary: Vec<u8>,
}

impl CollationKey {
    fn new(s: &str) -> Self {
        let mut key = Self {
            primary: Vec::with_capacity(s.len()),
            secondary: Vec::with_capacity(s.len()),
            tertiary: Vec::with_capacity(s.len()),
        };
        for ch in s.chars() {
            let is_upper = ch.is_uppercase();
            for lower in ch.to_lowercase() {
                let (base, accent) = fold_accent(lower);
                // Leave a gap after every letter so `ñ` can sit right after `n`.
                let weight = if lower == 'ñ' {
                    u32::from('n') * 2 + 1
                } else {
                    u32::from(base) * 2
                };
                key.primary.push(weight);
                key.secondary.push(accent);
                key.tertiary.push(u8::from(is_upper));
            }
        }
        key
    }
}

/// Split a lowercase letter into its base letter and an accent rank.
///
/// Letters are decomposed (NFD); the first combining mark decides the rank.
fn fold_accent(ch: char) -> (char, u8) {
    let mut parts = ch.nfd();
    let base = parts.next().unwrap_or(ch);
    (base, parts.next().map_or(0, accent_rank))
}

const fn accent_rank(mark: char) -> u8 {
    match mark {
        '\u{301}' => 1, // acute
        '\u{300}' => 2, // grave
        '\u{302}' => 3, // circumflex
        '\u{308}' => 4, // diaeresis
        '\u{303}' => 5, // tilde
        '\u{30a}' => 6, // ring
        '\u{327}' => 7, // cedilla
        _ => 8,
    }
}
