//! Data models
//!
//! Shared between the workflow core and its consumers. All monetary
//! fields are f64 in the currency unit; arithmetic happens through
//! `rust_decimal` in the core. All timestamps are Unix milliseconds.

pub mod courier;
pub mod neighborhood;
pub mod order;
pub mod shift;

// Re-exports
pub use courier::*;
pub use neighborhood::*;
pub use order::*;
pub use shift::*;
