//! Price engine: derived prices from a base price, a size surcharge and a
//! discount percentage.
//!
//! Amounts are whole Colombian pesos held in an `i64`. The discount is
//! applied with exact decimal arithmetic and rounded to the nearest peso,
//! midpoints away from zero, so `1005` at 30% off is `704` on every platform.
//!
//! ```rust
//! use lumina_core::derive_price;
//!
//! let price = derive_price(50_000, 5_000, 20);
//! assert_eq!(price.pre_discount, 55_000);
//! assert_eq!(price.final_price, 44_000);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Smallest discount that can be applied.
pub const MIN_DISCOUNT_PERCENT: i64 = 0;
/// Largest discount that can be applied.
pub const MAX_DISCOUNT_PERCENT: i64 = 100;

/// A price before and after the product discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PriceBreakdown {
    /// `base + extra`, the struck-through price when a discount applies.
    pub pre_discount: i64,
    /// Price the customer pays.
    #[serde(rename = "final")]
    pub final_price: i64,
}

impl PriceBreakdown {
    /// Whether the final price is lower than the pre-discount price.
    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.final_price != self.pre_discount
    }
}

/// Clamp a discount percentage into `[0, 100]`.
#[must_use]
pub const fn clamp_discount(discount_percent: i64) -> i64 {
    if discount_percent < MIN_DISCOUNT_PERCENT {
        MIN_DISCOUNT_PERCENT
    } else if discount_percent > MAX_DISCOUNT_PERCENT {
        MAX_DISCOUNT_PERCENT
    } else {
        discount_percent
    }
}

/// Compute the displayed price for a base price, a size surcharge and a
/// discount.
///
/// The discount is clamped into `[0, 100]` first. Negative amounts are not
/// rejected; they flow through the arithmetic unchanged.
#[must_use]
pub fn derive_price(base_price: i64, extra: i64, discount_percent: i64) -> PriceBreakdown {
    let pre_discount = base_price.saturating_add(extra);
    let discount = clamp_discount(discount_percent);

    let discounted = Decimal::from(pre_discount) * Decimal::from(MAX_DISCOUNT_PERCENT - discount)
        / Decimal::ONE_HUNDRED;
    let final_price = discounted
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(pre_discount);

    PriceBreakdown {
        pre_discount,
        final_price,
    }
}

/// Format an amount as Colombian pesos, e.g. `$ 44.000`.
#[must_use]
pub fn format_cop(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-$ {grouped}")
    } else {
        format!("$ {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_scenario_price() {
        let price = derive_price(50_000, 5_000, 20);
        assert_eq!(price.pre_discount, 55_000);
        assert_eq!(price.final_price, 44_000);
        assert!(price.is_discounted());
    }

    #[test]
    fn test_zero_discount_is_identity() {
        for (base, extra) in [(0, 0), (1, 0), (35_000, 4_000), (999_999, 1)] {
            let price = derive_price(base, extra, 0);
            assert_eq!(price.final_price, base + extra);
            assert!(!price.is_discounted());
        }
    }

    #[test]
    fn test_full_discount_is_free() {
        assert_eq!(derive_price(120_000, 8_000, 100).final_price, 0);
    }

    #[test]
    fn test_discount_is_clamped() {
        assert_eq!(derive_price(10_000, 0, -15), derive_price(10_000, 0, 0));
        assert_eq!(derive_price(10_000, 0, 250), derive_price(10_000, 0, 100));
    }

    #[test]
    fn test_rounding_midpoints_away_from_zero() {
        // 5 * 0.5 = 2.5
        assert_eq!(derive_price(5, 0, 50).final_price, 3);
        // 15 * 0.9 = 13.5
        assert_eq!(derive_price(15, 0, 10).final_price, 14);
        // 1005 * 0.7 = 703.5, which binary floating point lands just below
        assert_eq!(derive_price(1005, 0, 30).final_price, 704);
        // 7 * 0.85 = 5.95
        assert_eq!(derive_price(7, 0, 15).final_price, 6);
        // 11 * 0.67 = 7.37
        assert_eq!(derive_price(11, 0, 33).final_price, 7);
    }

    #[test]
    fn test_negative_inputs_compute_arithmetically() {
        let price = derive_price(-5, 0, 50);
        assert_eq!(price.pre_discount, -5);
        assert_eq!(price.final_price, -3);
    }

    #[test]
    fn test_final_within_bounds() {
        for base in [0, 1, 99, 1_000, 45_500, 1_234_567] {
            for extra in [0, 1, 500, 7_777] {
                for discount in 0..=100 {
                    let price = derive_price(base, extra, discount);
                    assert!(price.final_price >= 0);
                    assert!(price.final_price <= base + extra);
                }
            }
        }
    }

    #[test]
    fn test_price_breakdown_serializes_final_field() {
        let json = serde_json::to_value(derive_price(100, 0, 10)).unwrap_or_default();
        assert_eq!(json["final"], 90);
        assert_eq!(json["pre_discount"], 100);
    }

    #[test]
    fn test_format_cop() {
        assert_eq!(format_cop(0), "$ 0");
        assert_eq!(format_cop(950), "$ 950");
        assert_eq!(format_cop(44_000), "$ 44.000");
        assert_eq!(format_cop(1_250_000), "$ 1.250.000");
        assert_eq!(format_cop(-12_000), "-$ 12.000");
    }
}
