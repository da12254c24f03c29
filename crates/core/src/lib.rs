//! Cornerstore Core - Shared types library.
//!
//! This crate provides common types used across all Cornerstore components:
//! - `storefront` - Public-facing shop (listing, cart, checkout)
//! - `admin` - Create-product proxy in front of the commerce backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps it
//! lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - ID newtypes, prices, catalog products and backend error bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
