//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Catalog refresh from the hosted backend

pub mod catalog;
