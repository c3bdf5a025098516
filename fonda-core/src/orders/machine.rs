//! Order status transition rules
//!
//! Forward-only graph:
//!
//! ```text
//! RECEIVED → PREPARING → READY → OUT_FOR_DELIVERY → DELIVERED
//!     └──────────┴─────────┴──────────┴──► CANCELLED
//! ```
//!
//! DELIVERED additionally requires the delivery sub-record to already be
//! in sub-status DELIVERED - the consistency check between the two state
//! machines.

use shared::models::order::{DeliveryStatus, Order, OrderStatus};
use shared::order::event::Role;
use shared::{DomainError, DomainResult};

/// Whether `to` is reachable from `from` in one step
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (Received, Preparing)
        | (Preparing, Ready)
        | (Ready, OutForDelivery)
        | (OutForDelivery, Delivered) => true,
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    }
}

/// Roles notified when an edge is applied
pub fn audience_for(from: OrderStatus, to: OrderStatus) -> Vec<Role> {
    use OrderStatus::*;
    match (from, to) {
        (Received, Preparing) => vec![Role::Kitchen],
        (Preparing, Ready) => vec![Role::Delivery, Role::Counter],
        (Ready, OutForDelivery) => vec![Role::Counter],
        (OutForDelivery, Delivered) => vec![Role::Counter, Role::Admin],
        (_, Cancelled) => vec![Role::Kitchen, Role::Counter, Role::Admin],
        _ => vec![],
    }
}

/// Validate that `target` may be applied to `order` right now
pub fn validate_transition(order: &Order, target: OrderStatus) -> DomainResult<()> {
    if !can_transition(order.status, target) {
        return Err(DomainError::InvalidTransition {
            from: order.status,
            to: target,
        });
    }

    if target == OrderStatus::Delivered {
        match order.delivery_status() {
            Some(DeliveryStatus::Delivered) => {}
            Some(sub) => {
                return Err(DomainError::invalid_state(format!(
                    "order {} cannot become DELIVERED while delivery is {}",
                    order.receipt_number, sub
                )));
            }
            None => {
                return Err(DomainError::invalid_state(format!(
                    "order {} has no delivery record",
                    order.receipt_number
                )));
            }
        }
    }

    Ok(())
}
