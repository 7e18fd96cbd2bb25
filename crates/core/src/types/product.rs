//! Catalog records as stored by the hosted backend.
//!
//! Field names follow the backend's column names (`desc`, `base_price`,
//! `product_id`, ...) so rows deserialize directly. Nullable text, number and
//! array columns fall back to their empty values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{ProductId, SizeId};
use super::price::{PriceBreakdown, clamp_discount, derive_price};

/// Label of the synthesized variant offered when a product has no sizes.
pub const DEFAULT_SIZE_LABEL: &str = "Única";
/// Color offered when a product lists no colors.
pub const DEFAULT_COLOR: &str = "Único";

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(rename = "desc", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_price: i64,
    /// Raw stored discount; always read through [`Product::discount`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_percent: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub colors: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Discount percentage clamped into `[0, 100]`.
    #[must_use]
    pub const fn discount(&self) -> i64 {
        clamp_discount(self.discount_percent)
    }

    /// Price of this product with the given size surcharge.
    #[must_use]
    pub fn price_with(&self, extra: i64) -> PriceBreakdown {
        derive_price(self.base_price, extra, self.discount_percent)
    }

    /// Selectable colors: trimmed, non-empty labels, or the single default
    /// color when none remain.
    #[must_use]
    pub fn colors_or_default(&self) -> Vec<String> {
        let cleaned: Vec<String> = self
            .colors
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
            .collect();

        if cleaned.is_empty() {
            vec![DEFAULT_COLOR.to_owned()]
        } else {
            cleaned
        }
    }
}

/// A purchasable size option for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    pub id: SizeId,
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra_price: i64,
}

impl SizeVariant {
    /// The synthesized "Única" variant for a product without stored sizes.
    #[must_use]
    pub fn default_for(product_id: ProductId) -> Self {
        Self {
            id: SizeId::default_size(),
            product_id,
            label: DEFAULT_SIZE_LABEL.to_owned(),
            extra_price: 0,
        }
    }
}

/// Deserialize `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_backend_row() {
        let row = serde_json::json!({
            "id": "8b0d",
            "name": "Manilla Luna",
            "category": "manillas",
            "desc": "Hilo encerado",
            "base_price": 35000,
            "discount_percent": 10,
            "featured": true,
            "colors": ["Rojo", "Azul"],
            "image_url": "https://cdn.example.co/a.webp",
            "image_path": "2025/a.webp",
            "created_at": "2025-03-01T12:00:00+00:00",
            "updated_at": null
        });

        let product: Product = serde_json::from_value(row).unwrap();
        assert_eq!(product.id.as_str(), "8b0d");
        assert_eq!(product.description, "Hilo encerado");
        assert_eq!(product.base_price, 35_000);
        assert!(product.featured);
        assert_eq!(product.colors, vec!["Rojo", "Azul"]);
        assert!(product.created_at.is_some());
        assert!(product.updated_at.is_none());
    }

    #[test]
    fn test_product_null_columns_default() {
        let row = serde_json::json!({
            "id": "p1",
            "name": null,
            "desc": null,
            "base_price": null,
            "discount_percent": null,
            "featured": null,
            "colors": null
        });

        let product: Product = serde_json::from_value(row).unwrap();
        assert_eq!(product.name, "");
        assert_eq!(product.category, "");
        assert_eq!(product.base_price, 0);
        assert!(!product.featured);
        assert!(product.colors.is_empty());
        assert!(product.image_url.is_none());
    }

    #[test]
    fn test_discount_clamped_on_read() {
        let mut product: Product = serde_json::from_value(serde_json::json!({"id": "p"})).unwrap();
        product.discount_percent = 140;
        assert_eq!(product.discount(), 100);
        product.discount_percent = -3;
        assert_eq!(product.discount(), 0);
    }

    #[test]
    fn test_colors_or_default() {
        let mut product: Product = serde_json::from_value(serde_json::json!({"id": "p"})).unwrap();
        assert_eq!(product.colors_or_default(), vec![DEFAULT_COLOR]);

        product.colors = vec!["  ".into(), " Dorado ".into(), "Plata".into()];
        assert_eq!(product.colors_or_default(), vec!["Dorado", "Plata"]);
    }

    #[test]
    fn test_default_variant() {
        let variant = SizeVariant::default_for(ProductId::new("p"));
        assert!(variant.id.is_default());
        assert_eq!(variant.label, DEFAULT_SIZE_LABEL);
        assert_eq!(variant.extra_price, 0);
    }
}
