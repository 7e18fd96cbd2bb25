//! Lumina Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Architecture
//!
//! - [`backend`] - Read-only catalog client for the hosted backend
//! - [`cart_slot`] - File-backed cart slot
//! - [`services`] - Catalog refresh
//! - [`routes`] - JSON API over the [`lumina_core::shop::Shop`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart_slot;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
