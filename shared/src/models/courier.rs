//! Courier Model (repartidor)

use serde::{Deserialize, Serialize};

/// Courier entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Commission percentage applied to the order total at assignment (0-100)
    pub commission_percent: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
