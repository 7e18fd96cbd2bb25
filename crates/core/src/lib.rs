//! Lumina Core - catalog, pricing and cart logic.
//!
//! This crate provides the pure storefront logic shared by all Lumina
//! components:
//! - `storefront` - Public JSON API over the catalog and the local cart
//! - `admin` - Authenticated product management against the hosted backend
//! - `cli` - Command-line tools for browsing and managing the catalog
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and traits - no network
//! access and no file I/O. Cart persistence goes through the
//! [`cart::CartRepository`] port so callers decide where the cart lives.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices and catalog records
//! - [`catalog`] - Product/size lookup built from fetched rows
//! - [`listing`] - Filter and sort pipeline for the product grid
//! - [`cart`] - Cart lines, merge/clamp rules and the persisted cart store
//! - [`checkout`] - Subtotal, shipping and total
//! - [`shop`] - The storefront context object tying everything together
//! - [`rest`] - Column lists and error bodies of the backend's REST API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod listing;
pub mod rest;
pub mod shop;
pub mod types;

pub use types::*;
