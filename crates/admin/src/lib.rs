//! Lumina Admin library.
//!
//! Authenticated product management against the hosted backend: password
//! sign-in with an admin check, product create/update/delete, size
//! replacement and product image storage.
//!
//! # Security
//!
//! Writes rely on the backend's row-level security. The console refuses to
//! start a session for users whose profile is not flagged as admin.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod products;
pub mod services;

pub use error::{AdminError, WriteError};
