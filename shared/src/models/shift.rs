//! Shift Model (turno)

use serde::{Deserialize, Serialize};

use super::order::PaymentMethod;

/// Shift kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftKind {
    Morning,
    Evening,
}

/// Shift status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    #[default]
    Open,
    Closed,
}

/// Running totals per payment method, in currency unit
///
/// Additive only while the shift is open; cancellations never subtract
/// because cancelled orders are never recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PaymentTotals {
    pub cash: f64,
    pub card: f64,
    pub transfer: f64,
    pub app: f64,
}

impl PaymentTotals {
    pub fn bucket(&self, method: PaymentMethod) -> f64 {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Card => self.card,
            PaymentMethod::Transfer => self.transfer,
            PaymentMethod::App => self.app,
        }
    }

    pub fn bucket_mut(&mut self, method: PaymentMethod) -> &mut f64 {
        match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Card => &mut self.card,
            PaymentMethod::Transfer => &mut self.transfer,
            PaymentMethod::App => &mut self.app,
        }
    }
}

/// Running order counters for a shift
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrderCounters {
    /// Orders created under this shift
    pub received: i32,
    /// Orders that reached DELIVERED (the only ones counted in totals)
    pub delivered: i32,
    /// Orders cancelled under this shift
    pub cancelled: i32,
}

/// Closing record, written exactly once when the shift is sealed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftClosing {
    /// Cash counted in the drawer
    pub counted_cash: f64,
    /// starting_cash + cash-method total
    pub expected_cash: f64,
    /// counted_cash - expected_cash; positive = surplus, negative = shortage
    pub variance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    /// Closer reference (String ID)
    pub closed_by: String,
    pub closed_at: i64,
}

/// Shift entity (turno)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: Option<String>,
    pub kind: ShiftKind,
    #[serde(default)]
    pub status: ShiftStatus,
    pub opened_at: i64,
    /// Cashier reference (String ID)
    pub cashier_id: String,
    /// Authorizing manager reference (String ID)
    pub manager_id: String,
    /// Initial cash float
    #[serde(default)]
    pub starting_cash: f64,
    #[serde(default)]
    pub totals: PaymentTotals,
    #[serde(default)]
    pub counters: OrderCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing: Option<ShiftClosing>,
    /// Closed without cash count (power failure, crash)
    #[serde(default)]
    pub abnormal_close: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Optimistic-concurrency revision, bumped on every stored update
    #[serde(default)]
    pub version: u64,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

/// Open shift payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftOpen {
    pub kind: ShiftKind,
    #[serde(default)]
    pub starting_cash: f64,
    pub cashier_id: String,
    pub manager_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Close shift payload (normal close with cash counting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftClose {
    pub counted_cash: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    pub closed_by: String,
}
