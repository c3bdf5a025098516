//! Shared types for the Fonda restaurant CRM core
//!
//! Common types used across the workspace: domain models, notification
//! event types, the error taxonomy, and small utilities.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use error::{DomainError, DomainResult};
pub use serde::{Deserialize, Serialize};
