//! Cornerstore Admin library.
//!
//! A stateless proxy that creates products in the commerce backend on behalf
//! of the storefront's add-product form, keeping the secret key server-side.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
