//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use lumina_core::ProductId;
use lumina_core::listing::{ListingEntry, ListingFilters, ProductDetail, SortKey};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for the product grid. Every field is optional and
/// unusable values are ignored rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub featured: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
}

impl ListingQuery {
    fn filters(&self) -> ListingFilters {
        ListingFilters {
            text: self.q.clone().unwrap_or_default(),
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            featured_only: self
                .featured
                .as_deref()
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "on" | "yes")),
            price_ceiling: self
                .max_price
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        }
    }

    fn sort(&self) -> SortKey {
        self.sort
            .as_deref()
            .map(SortKey::parse_or_default)
            .unwrap_or_default()
    }
}

/// Product grid response.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub sort: SortKey,
    pub count: usize,
    pub products: Vec<ListingEntry>,
}

/// Filtered and sorted product grid.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Json<ListingResponse> {
    let sort = query.sort();
    let products = state.shop().await.listing_view(&query.filters(), sort);

    Json(ListingResponse {
        sort,
        count: products.len(),
        products,
    })
}

/// Product detail with priced sizes and selectable colors.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let id = ProductId::new(id);
    state
        .shop()
        .await
        .product_detail(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        let mut q = ListingQuery::default();
        for (k, v) in pairs {
            let v = Some((*v).to_string());
            match *k {
                "q" => q.q = v,
                "category" => q.category = v,
                "featured" => q.featured = v,
                "max_price" => q.max_price = v,
                "sort" => q.sort = v,
                _ => {}
            }
        }
        q
    }

    #[test]
    fn test_empty_query_means_no_filters() {
        let q = query(&[]);
        assert_eq!(q.filters(), ListingFilters::default());
        assert_eq!(q.sort(), SortKey::FeaturedRecent);
    }

    #[test]
    fn test_query_parsing() {
        let q = query(&[
            ("q", "luna"),
            ("category", " manillas "),
            ("featured", "true"),
            ("max_price", "45000"),
            ("sort", "price_desc"),
        ]);
        let filters = q.filters();
        assert_eq!(filters.text, "luna");
        assert_eq!(filters.category, "manillas");
        assert!(filters.featured_only);
        assert_eq!(filters.price_ceiling, Some(45_000.0));
        assert_eq!(q.sort(), SortKey::PriceDesc);
    }

    #[test]
    fn test_unusable_values_are_ignored() {
        let q = query(&[
            ("featured", "maybe"),
            ("max_price", "cheap"),
            ("sort", "random"),
        ]);
        let filters = q.filters();
        assert!(!filters.featured_only);
        assert!(filters.price_ceiling.is_none());
        assert_eq!(q.sort(), SortKey::FeaturedRecent);

        let q = query(&[("max_price", "inf")]);
        assert!(q.filters().price_ceiling.is_none());
    }
}
