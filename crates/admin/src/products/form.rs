//! Product editor form parsing.
//!
//! Everything the admin types is validated here before any backend call.

use std::str::FromStr;

use lumina_core::{DEFAULT_SIZE_LABEL, clamp_discount};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Serialize;
use thiserror::Error;

/// An invalid field in the product form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("category is required")]
    MissingCategory,

    #[error("base price must be a number, got {0:?}")]
    InvalidPrice(String),

    #[error("base price cannot be negative")]
    NegativePrice,

    #[error("discount must be a number, got {0:?}")]
    InvalidDiscount(String),

    /// `line` is 1-based and counts blank lines.
    #[error("size line {line} is malformed: {reason}")]
    MalformedSizeLine { line: usize, reason: String },
}

/// Raw editor input, as typed.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub category: String,
    pub description: String,
    pub base_price: String,
    pub discount: String,
    pub featured: bool,
    /// Comma-separated color labels.
    pub colors: String,
    /// One `label, extra` per line.
    pub sizes: String,
}

/// A size row ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeDraft {
    pub label: String,
    pub extra_price: i64,
}

impl SizeDraft {
    /// The size every product gets when none are listed.
    #[must_use]
    pub fn single() -> Self {
        Self {
            label: DEFAULT_SIZE_LABEL.to_string(),
            extra_price: 0,
        }
    }
}

/// Validated product fields.
///
/// Serializes to the `products` row payload; `sizes` are written separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub base_price: i64,
    pub discount_percent: i64,
    pub featured: bool,
    pub colors: Vec<String>,
    #[serde(skip)]
    pub sizes: Vec<SizeDraft>,
}

impl ProductForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn parse(&self) -> Result<ProductDraft, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let category = self.category.trim().to_lowercase();
        if category.is_empty() {
            return Err(ValidationError::MissingCategory);
        }

        let base_price = parse_amount(&self.base_price)
            .ok_or_else(|| ValidationError::InvalidPrice(self.base_price.trim().to_string()))?;
        if base_price < 0 {
            return Err(ValidationError::NegativePrice);
        }
        let discount = parse_amount(&self.discount)
            .ok_or_else(|| ValidationError::InvalidDiscount(self.discount.trim().to_string()))?;

        let mut sizes = parse_size_lines(&self.sizes)?;
        if sizes.is_empty() {
            sizes.push(SizeDraft::single());
        }

        Ok(ProductDraft {
            name: name.to_string(),
            category,
            description: self.description.trim().to_string(),
            base_price,
            discount_percent: clamp_discount(discount),
            featured: self.featured,
            colors: parse_colors(&self.colors),
            sizes,
        })
    }
}

/// Split a comma-separated color list. Labels are trimmed, empties dropped
/// and repeats removed, keeping the first occurrence.
#[must_use]
pub fn parse_colors(input: &str) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for color in input.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !colors.iter().any(|c| c == color) {
            colors.push(color.to_string());
        }
    }
    colors
}

/// Parse one `label, extra` size per line. Blank lines are skipped and a
/// missing extra means 0.
///
/// # Errors
///
/// Returns `MalformedSizeLine` for an empty label, a non-numeric or
/// negative extra, or more than two fields.
pub fn parse_size_lines(input: &str) -> Result<Vec<SizeDraft>, ValidationError> {
    let mut sizes = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: &str| ValidationError::MalformedSizeLine {
            line: index + 1,
            reason: reason.to_string(),
        };

        let mut fields = line.split(',').map(str::trim);
        let label = fields.next().unwrap_or_default();
        let extra = fields.next().unwrap_or_default();
        if fields.next().is_some() {
            return Err(malformed("expected `label, extra`"));
        }
        if label.is_empty() {
            return Err(malformed("missing label"));
        }
        let extra_price = parse_amount(extra).ok_or_else(|| malformed("extra is not a number"))?;
        if extra_price < 0 {
            return Err(malformed("extra cannot be negative"));
        }

        sizes.push(SizeDraft {
            label: label.to_string(),
            extra_price,
        });
    }
    Ok(sizes)
}

/// Parse a whole amount. Blank is 0; decimals round half away from zero.
fn parse_amount(input: &str) -> Option<i64> {
    let input = input.trim();
    if input.is_empty() {
        return Some(0);
    }
    Decimal::from_str(input)
        .ok()?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
