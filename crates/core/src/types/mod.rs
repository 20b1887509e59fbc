//! Core types for the POS dashboard.
//!
//! This module provides type-safe wrappers for catalog ids and prices.

pub mod id;
pub mod price;

pub use id::ProductId;
pub use price::{Price, PriceError};
