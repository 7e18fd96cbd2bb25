//! Core types for Lumina.
//!
//! This module provides type-safe wrappers for catalog identifiers, prices
//! and the records fetched from the hosted backend.

pub mod id;
pub mod price;
pub mod product;

pub use id::{ProductId, SizeId};
pub use price::{PriceBreakdown, clamp_discount, derive_price, format_cop};
pub use product::{DEFAULT_COLOR, DEFAULT_SIZE_LABEL, Product, SizeVariant};
