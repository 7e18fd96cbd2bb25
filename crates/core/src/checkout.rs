//! Checkout totals: subtotal, shipping and grand total of a cart.

use serde::{Deserialize, Serialize};

use crate::cart::{CartKey, CartLine};
use crate::catalog::CatalogIndex;
use crate::types::{ProductId, SizeId};

/// Subtotal from which shipping is free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 150_000;
/// Shipping charged below the free-shipping threshold.
pub const DEFAULT_SHIPPING_FLAT_FEE: i64 = 12_000;

/// Tiered shipping: free above a threshold, flat fee otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_shipping_threshold: i64,
    pub flat_fee: i64,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            flat_fee: DEFAULT_SHIPPING_FLAT_FEE,
        }
    }
}

impl ShippingPolicy {
    /// Shipping charged for a subtotal. An empty subtotal ships for free.
    #[must_use]
    pub const fn shipping_for(&self, subtotal: i64) -> i64 {
        if subtotal == 0 || subtotal >= self.free_shipping_threshold {
            0
        } else {
            self.flat_fee
        }
    }
}

/// Subtotal, shipping and total of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CheckoutTotals {
    pub subtotal: i64,
    pub shipping: i64,
    pub total: i64,
}

impl CheckoutTotals {
    #[must_use]
    pub const fn from_subtotal(subtotal: i64, policy: &ShippingPolicy) -> Self {
        let shipping = policy.shipping_for(subtotal);
        Self {
            subtotal,
            shipping,
            total: subtotal.saturating_add(shipping),
        }
    }
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub size_id: SizeId,
    pub size_label: String,
    pub color: String,
    pub qty: u32,
    pub product_name: String,
    pub image_url: Option<String>,
    pub unit_price: i64,
    pub unit_pre_discount: i64,
    pub line_total: i64,
}

/// Everything the cart drawer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub lines: Vec<PricedLine>,
    /// Lines whose product is no longer in the catalog. They count towards
    /// `item_count` but not towards the totals.
    pub stale: Vec<CartKey>,
    pub subtotal: i64,
    pub shipping: i64,
    pub total: i64,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub const fn totals(&self) -> CheckoutTotals {
        CheckoutTotals {
            subtotal: self.subtotal,
            shipping: self.shipping,
            total: self.total,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

fn price_line(line: &CartLine, catalog: &CatalogIndex) -> Option<PricedLine> {
    let product = catalog.product(&line.product_id)?;
    let price = product.price_with(catalog.extra_for(&line.product_id, &line.size_id));
    Some(PricedLine {
        product_id: line.product_id.clone(),
        size_id: line.size_id.clone(),
        size_label: line.size_label.clone(),
        color: line.color.clone(),
        qty: line.qty,
        product_name: product.name.clone(),
        image_url: product.image_url.clone(),
        unit_price: price.final_price,
        unit_pre_discount: price.pre_discount,
        line_total: price.final_price.saturating_mul(i64::from(line.qty)),
    })
}

/// Totals of `lines` priced against `catalog`. Lines whose product is gone
/// are skipped; a size the product doesn't have contributes no surcharge.
#[must_use]
pub fn compute_totals(
    lines: &[CartLine],
    catalog: &CatalogIndex,
    policy: &ShippingPolicy,
) -> CheckoutTotals {
    let subtotal = lines
        .iter()
        .filter_map(|l| price_line(l, catalog))
        .fold(0_i64, |acc, l| acc.saturating_add(l.line_total));
    CheckoutTotals::from_subtotal(subtotal, policy)
}

/// Price every line and flag the stale ones.
#[must_use]
pub fn cart_view(lines: &[CartLine], catalog: &CatalogIndex, policy: &ShippingPolicy) -> CartView {
    let mut priced = Vec::with_capacity(lines.len());
    let mut stale = Vec::new();
    for line in lines {
        match price_line(line, catalog) {
            Some(p) => priced.push(p),
            None => stale.push(line.key()),
        }
    }

    let subtotal = priced
        .iter()
        .fold(0_i64, |acc, l| acc.saturating_add(l.line_total));
    let totals = CheckoutTotals::from_subtotal(subtotal, policy);

    CartView {
        lines: priced,
        stale,
        subtotal: totals.subtotal,
        shipping: totals.shipping,
        total: totals.total,
        item_count: lines.iter().map(|l| l.qty).sum(),
    }
}
