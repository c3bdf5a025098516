//! Neighborhood Model (colonia - delivery-zone pricing)

use serde::{Deserialize, Serialize};

/// Neighborhood entity
///
/// Shipping cost is copied into an order's totals at creation, never
/// referenced live, so later price changes leave historical orders intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighborhood {
    pub id: Option<String>,
    pub name: String,
    /// Zone label (grouping for dispatch)
    pub zone: String,
    /// Shipping cost in currency unit
    pub shipping_cost: f64,
    /// Only active neighborhoods are offered at order entry
    #[serde(default)]
    pub is_active: bool,
}
