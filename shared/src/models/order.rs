//! Order Model

use serde::{Deserialize, Serialize};

/// Sales channel an order came in through
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Whatsapp,
    Call,
    Counter,
    Uber,
    Didi,
    Web,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Whatsapp => write!(f, "WHATSAPP"),
            Channel::Call => write!(f, "CALL"),
            Channel::Counter => write!(f, "COUNTER"),
            Channel::Uber => write!(f, "UBER"),
            Channel::Didi => write!(f, "DIDI"),
            Channel::Web => write!(f, "WEB"),
        }
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Paid through the delivery-app channel (Uber/Didi settle separately)
    App,
}

/// Order status
///
/// Forward-only graph: Received → Preparing → Ready → OutForDelivery →
/// Delivered. Cancelled is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Received,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Received => write!(f, "RECEIVED"),
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::Ready => write!(f, "READY"),
            OrderStatus::OutForDelivery => write!(f, "OUT_FOR_DELIVERY"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Delivery sub-status (only meaningful while a delivery record exists)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Assigned,
    EnRoute,
    Delivered,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Assigned => write!(f, "ASSIGNED"),
            DeliveryStatus::EnRoute => write!(f, "EN_ROUTE"),
            DeliveryStatus::Delivered => write!(f, "DELIVERED"),
        }
    }
}

/// Customer data captured at order entry
///
/// A snapshot, not a live reference: later edits to the customer record
/// never change a historical order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Neighborhood (colonia) name, for delivery-zone pricing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Product reference (String ID)
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    /// Unit price in currency unit (customization surcharges already embedded)
    pub unit_price: f64,
    /// Chosen customizations (display snapshot)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<String>,
    /// Line subtotal = unit_price * quantity, computed at creation
    pub line_total: f64,
}

/// Order item input - for order creation (line_total not yet computed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    #[serde(default)]
    pub customizations: Vec<String>,
}

/// Discount applied to an order's subtotal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    /// Percentage of subtotal, 0-100 inclusive
    Percentage(f64),
    /// Fixed amount, capped at subtotal
    FixedAmount(f64),
}

/// Order totals, all in currency unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub shipping: f64,
    /// max(0, subtotal - discount) + shipping
    pub total: f64,
}

/// Order payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPayment {
    pub method: PaymentMethod,
    /// Whether the customer needs change (cash orders with tendered amount)
    #[serde(default)]
    pub requires_change: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_due: Option<f64>,
}

/// Payment input - for order creation (change not yet computed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    /// Amount tendered; when set for cash payments, change is computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<f64>,
}

/// Advisory incident attached to a delivery (never blocks progress)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentNote {
    pub reason: String,
    pub reported_at: i64,
}

/// Delivery sub-record (reparto)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryRecord {
    /// Courier reference (String ID)
    pub courier_id: String,
    /// Courier name snapshot
    pub courier_name: String,
    /// Commission in currency unit, frozen at assignment
    pub commission: f64,
    #[serde(default)]
    pub status: DeliveryStatus,
    pub assigned_at: i64,
    pub delivered_at: Option<i64>,
    /// Settlement flag - set exactly once, by a batch liquidation
    #[serde(default)]
    pub settled: bool,
    pub settled_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incidents: Vec<IncidentNote>,
}

/// Order entity (pedido)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    /// Human-readable date-scoped number, `YYYYMMDD-NNNN`
    pub receipt_number: String,
    pub channel: Channel,
    pub customer: CustomerSnapshot,
    pub items: Vec<OrderItem>,
    pub totals: OrderTotals,
    pub payment: OrderPayment,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryRecord>,
    /// Internal note (staff only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Customer-facing note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    /// Shift the order was created under
    pub shift_id: String,
    pub created_at: i64,
    /// Optimistic-concurrency revision, bumped on every stored update
    #[serde(default)]
    pub version: u64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub channel: Channel,
    pub customer: CustomerSnapshot,
    pub items: Vec<OrderItemInput>,
    pub payment: PaymentInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
}

impl Order {
    /// Whether this order has a delivery record in the given sub-status
    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        self.delivery.as_ref().map(|d| d.status)
    }
}
