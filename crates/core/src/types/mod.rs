//! Core types for Cornerstore.
//!
//! These mirror the JSON shapes returned by the commerce backend that more
//! than one binary needs to understand.

pub mod api_error;
pub mod id;
pub mod price;
pub mod product;

pub use api_error::{ApiErrorBody, ApiErrorDetail};
pub use id::*;
pub use price::Price;
pub use product::{Category, Image, Product};
