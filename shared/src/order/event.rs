//! Notification events - facts emitted after a state change is applied

use serde::{Deserialize, Serialize};

use crate::models::order::{Channel, OrderStatus, PaymentMethod};
use crate::models::shift::ShiftKind;

/// Audience role for a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Kitchen,
    Counter,
    Delivery,
    Admin,
}

/// Notification priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// Notification event - describes what happened, for whom
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Event unique ID
    pub event_id: String,
    /// Order this event refers to (empty for shift events)
    pub order_id: String,
    /// Receipt number snapshot for display
    pub receipt_number: String,
    /// Roles that should see this event
    pub audience: Vec<Role>,
    #[serde(default)]
    pub priority: Priority,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub payload: NotificationPayload,
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPayload {
    OrderCreated {
        channel: Channel,
        total: f64,
    },

    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
    },

    CourierAssigned {
        courier_id: String,
        courier_name: String,
        commission: f64,
    },

    DeliveryIncident {
        courier_id: String,
        reason: String,
    },

    OrdersSettled {
        courier_id: String,
        order_count: usize,
        commission_total: f64,
    },

    ShiftOpened {
        shift_id: String,
        kind: ShiftKind,
    },

    ShiftClosed {
        shift_id: String,
        variance: f64,
    },

    OrderCompletionRecorded {
        shift_id: String,
        method: PaymentMethod,
        amount: f64,
    },
}

impl NotificationEvent {
    pub fn new(
        order_id: impl Into<String>,
        receipt_number: impl Into<String>,
        audience: Vec<Role>,
        timestamp: i64,
        payload: NotificationPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            receipt_number: receipt_number.into(),
            audience,
            priority: Priority::Normal,
            timestamp,
            payload,
        }
    }

    /// Event about a shift rather than a single order
    pub fn for_shift(audience: Vec<Role>, timestamp: i64, payload: NotificationPayload) -> Self {
        Self::new("", "", audience, timestamp, payload)
    }

    /// Mark this event high-priority (incident alerts)
    pub fn high_priority(mut self) -> Self {
        self.priority = Priority::High;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_event_is_high_priority() {
        let event = NotificationEvent::new(
            "order-1",
            "20250101-0001",
            vec![Role::Admin],
            1_700_000_000_000,
            NotificationPayload::DeliveryIncident {
                courier_id: "courier-1".to_string(),
                reason: "flat tire".to_string(),
            },
        )
        .high_priority();

        assert_eq!(event.priority, Priority::High);
        assert_eq!(event.audience, vec![Role::Admin]);
    }

    #[test]
    fn test_payload_wire_tag() {
        let payload = NotificationPayload::StatusChanged {
            from: OrderStatus::Received,
            to: OrderStatus::Preparing,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"type\":\"STATUS_CHANGED\""));
    }
}
