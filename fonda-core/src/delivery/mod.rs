//! Delivery Assignment & Settlement
//!
//! Sub-state machine layered on order status OUT_FOR_DELIVERY:
//!
//! ```text
//! ASSIGNED → EN_ROUTE → DELIVERED
//! ```
//!
//! Commission is computed once at assignment and frozen. Marking the
//! delivery DELIVERED does not advance the order status - that is a
//! separate, explicit transition (two independently-driven signals).
//! Settlement (liquidación) is an all-or-nothing batch per courier.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::models::order::{DeliveryRecord, DeliveryStatus, IncidentNote, Order, OrderStatus};
use shared::order::event::{NotificationEvent, NotificationPayload, Role};
use shared::{DomainError, DomainResult};

use crate::clock::Clock;
use crate::notify::{NotificationSink, emit};
use crate::pricing::{to_decimal, to_f64};
use crate::store::{CourierStore, OrderFilter, OrderStore, Store};

/// Outcome of a settlement batch
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementSummary {
    pub courier_id: String,
    pub order_count: usize,
    pub commission_total: f64,
    pub settled_at: i64,
}

pub struct DeliveryService {
    store: Arc<dyn Store>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl DeliveryService {
    pub fn new(
        store: Arc<dyn Store>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, sink, clock }
    }

    /// Assign a courier to a READY order
    ///
    /// Freezes commission = total * commission_percent / 100 and moves
    /// the order to OUT_FOR_DELIVERY.
    pub async fn assign(&self, order_id: &str, courier_id: &str) -> DomainResult<Order> {
        let order = self.load_order(order_id).await?;

        if order.status != OrderStatus::Ready {
            return Err(DomainError::invalid_state(format!(
                "order {} is {}, couriers are assigned to READY orders",
                order.receipt_number, order.status
            )));
        }
        if order.delivery.is_some() {
            return Err(DomainError::invalid_state(format!(
                "order {} already has a courier",
                order.receipt_number
            )));
        }

        let courier = self
            .store
            .get_courier(courier_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("courier {}", courier_id)))?;
        if !courier.is_active {
            return Err(DomainError::invalid_state(format!(
                "courier {} is inactive",
                courier.name
            )));
        }

        let commission = to_f64(
            to_decimal(order.totals.total) * to_decimal(courier.commission_percent)
                / Decimal::ONE_HUNDRED,
        );

        let now = self.clock.now_millis();
        let mut updated = order;
        updated.delivery = Some(DeliveryRecord {
            courier_id: courier.id.clone().unwrap_or_default(),
            courier_name: courier.name.clone(),
            commission,
            status: DeliveryStatus::Assigned,
            assigned_at: now,
            delivered_at: None,
            settled: false,
            settled_at: None,
            incidents: vec![],
        });
        updated.status = OrderStatus::OutForDelivery;
        let updated = self.store.update_order(&updated).await?;

        tracing::info!(
            receipt = %updated.receipt_number,
            courier = %courier.name,
            commission,
            "courier assigned"
        );

        emit(
            self.sink.as_ref(),
            NotificationEvent::new(
                updated.id.clone().unwrap_or_default(),
                updated.receipt_number.clone(),
                vec![Role::Kitchen, Role::Counter],
                now,
                NotificationPayload::CourierAssigned {
                    courier_id: courier.id.unwrap_or_default(),
                    courier_name: courier.name,
                    commission,
                },
            ),
        );

        Ok(updated)
    }

    /// ASSIGNED → EN_ROUTE
    pub async fn mark_en_route(&self, order_id: &str) -> DomainResult<Order> {
        let order = self.load_order(order_id).await?;
        let delivery = Self::require_delivery(&order)?;

        if order.status != OrderStatus::OutForDelivery {
            return Err(DomainError::invalid_state(format!(
                "order {} is {}, expected OUT_FOR_DELIVERY",
                order.receipt_number, order.status
            )));
        }
        if delivery.status != DeliveryStatus::Assigned {
            return Err(DomainError::invalid_state(format!(
                "delivery for {} is {}, expected ASSIGNED",
                order.receipt_number, delivery.status
            )));
        }

        let mut updated = order;
        if let Some(d) = updated.delivery.as_mut() {
            d.status = DeliveryStatus::EnRoute;
        }
        self.store.update_order(&updated).await
    }

    /// Mark the delivery itself complete
    ///
    /// Does NOT flip the order to DELIVERED; that is a separate
    /// transition driven by its own signal.
    pub async fn mark_delivered(&self, order_id: &str) -> DomainResult<Order> {
        let order = self.load_order(order_id).await?;
        let delivery = Self::require_delivery(&order)?;

        if order.status != OrderStatus::OutForDelivery {
            return Err(DomainError::invalid_state(format!(
                "order {} is {}, expected OUT_FOR_DELIVERY",
                order.receipt_number, order.status
            )));
        }
        if delivery.status == DeliveryStatus::Delivered {
            return Err(DomainError::invalid_state(format!(
                "delivery for {} is already DELIVERED",
                order.receipt_number
            )));
        }

        let now = self.clock.now_millis();
        let mut updated = order;
        if let Some(d) = updated.delivery.as_mut() {
            d.status = DeliveryStatus::Delivered;
            d.delivered_at = Some(now);
        }
        let updated = self.store.update_order(&updated).await?;
        tracing::info!(receipt = %updated.receipt_number, "delivery marked delivered");
        Ok(updated)
    }

    /// Attach an advisory incident and alert admin
    ///
    /// Incidents never change any status.
    pub async fn report_incident(&self, order_id: &str, reason: &str) -> DomainResult<Order> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("incident reason must not be empty"));
        }

        let order = self.load_order(order_id).await?;
        let delivery = Self::require_delivery(&order)?;
        let courier_id = delivery.courier_id.clone();

        let now = self.clock.now_millis();
        let mut updated = order;
        if let Some(d) = updated.delivery.as_mut() {
            d.incidents.push(IncidentNote {
                reason: reason.to_string(),
                reported_at: now,
            });
        }
        let updated = self.store.update_order(&updated).await?;

        tracing::warn!(
            receipt = %updated.receipt_number,
            courier_id = %courier_id,
            reason,
            "delivery incident reported"
        );

        emit(
            self.sink.as_ref(),
            NotificationEvent::new(
                updated.id.clone().unwrap_or_default(),
                updated.receipt_number.clone(),
                vec![Role::Admin],
                now,
                NotificationPayload::DeliveryIncident {
                    courier_id,
                    reason: reason.to_string(),
                },
            )
            .high_priority(),
        );

        Ok(updated)
    }

    /// Delivered, unsettled orders for a courier - the settlement work list
    ///
    /// Keyed on the delivery sub-status, not the order status: a delivery
    /// can be complete before the order is explicitly marked DELIVERED.
    pub async fn pending_settlement(&self, courier_id: &str) -> DomainResult<Vec<Order>> {
        let mut orders = self
            .store
            .query_orders(&OrderFilter::default().for_courier(courier_id).settled(false))
            .await?;
        orders.retain(|o| o.delivery_status() == Some(DeliveryStatus::Delivered));
        Ok(orders)
    }

    /// Settle a batch of delivered orders for one courier (liquidación)
    ///
    /// All-or-nothing: the whole batch is validated before anything is
    /// written. Any already-settled order fails the entire batch with no
    /// partial effect.
    pub async fn settle(&self, order_ids: &[String]) -> DomainResult<SettlementSummary> {
        if order_ids.is_empty() {
            return Err(DomainError::validation("settlement batch is empty"));
        }

        // Validation pass: load everything, write nothing
        let mut orders = Vec::with_capacity(order_ids.len());
        let mut courier_id: Option<String> = None;
        let mut commission_total = Decimal::ZERO;

        for id in order_ids {
            let order = self.load_order(id).await?;
            let delivery = Self::require_delivery(&order)?;

            if delivery.settled {
                return Err(DomainError::AlreadySettled(order.receipt_number.clone()));
            }
            if delivery.status != DeliveryStatus::Delivered {
                return Err(DomainError::invalid_state(format!(
                    "order {} delivery is {}, only DELIVERED orders settle",
                    order.receipt_number, delivery.status
                )));
            }
            match &courier_id {
                None => courier_id = Some(delivery.courier_id.clone()),
                Some(existing) if *existing == delivery.courier_id => {}
                Some(_) => {
                    return Err(DomainError::validation(
                        "settlement batch spans more than one courier",
                    ));
                }
            }

            commission_total += to_decimal(delivery.commission);
            orders.push(order);
        }
        let courier_id = courier_id.unwrap_or_default();

        // Write pass
        let now = self.clock.now_millis();
        for order in &mut orders {
            if let Some(d) = order.delivery.as_mut() {
                d.settled = true;
                d.settled_at = Some(now);
            }
            let updated = self.store.update_order(order).await?;
            *order = updated;
        }

        let summary = SettlementSummary {
            courier_id: courier_id.clone(),
            order_count: orders.len(),
            commission_total: to_f64(commission_total),
            settled_at: now,
        };

        tracing::info!(
            courier_id = %courier_id,
            orders = summary.order_count,
            commission_total = summary.commission_total,
            "courier settled"
        );

        emit(
            self.sink.as_ref(),
            NotificationEvent::for_shift(
                vec![Role::Admin, Role::Delivery],
                now,
                NotificationPayload::OrdersSettled {
                    courier_id,
                    order_count: summary.order_count,
                    commission_total: summary.commission_total,
                },
            ),
        );

        Ok(summary)
    }

    async fn load_order(&self, order_id: &str) -> DomainResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("order {}", order_id)))
    }

    fn require_delivery(order: &Order) -> DomainResult<&DeliveryRecord> {
        order.delivery.as_ref().ok_or_else(|| {
            DomainError::invalid_state(format!(
                "order {} has no delivery record",
                order.receipt_number
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::RecordingSink;
    use crate::store::MemoryStore;
    use shared::models::courier::Courier;
    use shared::models::order::*;
    use shared::order::event::Priority;

    const NOON: i64 = 1_735_754_400_000;

    struct Fixture {
        service: DeliveryService,
        store: Arc<MemoryStore>,
        sink: Arc<RecordingSink>,
        clock: Arc<FixedClock>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(FixedClock::new(NOON));
        let service = DeliveryService::new(store.clone(), sink.clone(), clock.clone());
        Fixture {
            service,
            store,
            sink,
            clock,
        }
    }

    async fn seed_courier(fx: &Fixture, percent: f64, active: bool) -> String {
        fx.store
            .create_courier(Courier {
                id: None,
                name: "Luis".to_string(),
                phone: None,
                commission_percent: percent,
                is_active: active,
            })
            .await
            .unwrap()
            .id
            .unwrap()
    }

    async fn seed_order(fx: &Fixture, status: OrderStatus, total: f64) -> String {
        let order = Order {
            id: None,
            receipt_number: "20250101-0001".to_string(),
            channel: Channel::Whatsapp,
            customer: CustomerSnapshot {
                name: "Ana".to_string(),
                phone: "5550000000".to_string(),
                address: Some("Calle 1".to_string()),
                neighborhood: Some("Centro".to_string()),
            },
            items: vec![],
            totals: OrderTotals {
                subtotal: total,
                discount: 0.0,
                shipping: 0.0,
                total,
            },
            payment: OrderPayment {
                method: PaymentMethod::Cash,
                requires_change: false,
                tendered: None,
                change_due: None,
            },
            status,
            delivery: None,
            note: None,
            customer_note: None,
            shift_id: "shift-1".to_string(),
            created_at: NOON,
            version: 0,
        };
        fx.store.create_order(order).await.unwrap().id.unwrap()
    }

    async fn delivered_order(fx: &Fixture, courier_id: &str, total: f64) -> String {
        let order_id = seed_order(fx, OrderStatus::Ready, total).await;
        fx.service.assign(&order_id, courier_id).await.unwrap();
        fx.service.mark_en_route(&order_id).await.unwrap();
        fx.service.mark_delivered(&order_id).await.unwrap();
        order_id
    }

    #[tokio::test]
    async fn test_assign_computes_frozen_commission() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let order_id = seed_order(&fx, OrderStatus::Ready, 210.0).await;

        let order = fx.service.assign(&order_id, &courier_id).await.unwrap();
        let delivery = order.delivery.unwrap();
        assert_eq!(delivery.commission, 21.0);
        assert_eq!(delivery.status, DeliveryStatus::Assigned);
        assert_eq!(order.status, OrderStatus::OutForDelivery);
    }

    #[tokio::test]
    async fn test_assign_requires_ready() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let order_id = seed_order(&fx, OrderStatus::Preparing, 100.0).await;

        let err = fx.service.assign(&order_id, &courier_id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_assign_rejects_double_assignment() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let order_id = seed_order(&fx, OrderStatus::Ready, 100.0).await;

        fx.service.assign(&order_id, &courier_id).await.unwrap();
        let err = fx.service.assign(&order_id, &courier_id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_assign_rejects_inactive_courier() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, false).await;
        let order_id = seed_order(&fx, OrderStatus::Ready, 100.0).await;

        let err = fx.service.assign(&order_id, &courier_id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_mark_delivered_keeps_order_status() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 15.0, true).await;
        let order_id = seed_order(&fx, OrderStatus::Ready, 100.0).await;
        fx.service.assign(&order_id, &courier_id).await.unwrap();

        let order = fx.service.mark_delivered(&order_id).await.unwrap();
        assert_eq!(order.delivery_status(), Some(DeliveryStatus::Delivered));
        // Decoupled: the order status stays OUT_FOR_DELIVERY
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert_eq!(order.delivery.unwrap().delivered_at, Some(NOON));
    }

    #[tokio::test]
    async fn test_mark_delivered_twice_fails() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 15.0, true).await;
        let order_id = seed_order(&fx, OrderStatus::Ready, 100.0).await;
        fx.service.assign(&order_id, &courier_id).await.unwrap();
        fx.service.mark_delivered(&order_id).await.unwrap();

        let err = fx.service.mark_delivered(&order_id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_incident_is_advisory_and_high_priority() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let order_id = seed_order(&fx, OrderStatus::Ready, 100.0).await;
        fx.service.assign(&order_id, &courier_id).await.unwrap();

        let order = fx
            .service
            .report_incident(&order_id, "address not found")
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::OutForDelivery);
        let delivery = order.delivery.unwrap();
        assert_eq!(delivery.status, DeliveryStatus::Assigned);
        assert_eq!(delivery.incidents.len(), 1);

        let alert = fx
            .sink
            .events()
            .into_iter()
            .find(|e| matches!(e.payload, NotificationPayload::DeliveryIncident { .. }))
            .unwrap();
        assert_eq!(alert.priority, Priority::High);
        assert_eq!(alert.audience, vec![Role::Admin]);
    }

    #[tokio::test]
    async fn test_pending_settlement_lists_unsettled_deliveries() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let a = delivered_order(&fx, &courier_id, 100.0).await;
        let b = delivered_order(&fx, &courier_id, 200.0).await;

        // An en-route order is not yet settleable
        let order_id = seed_order(&fx, OrderStatus::Ready, 50.0).await;
        fx.service.assign(&order_id, &courier_id).await.unwrap();

        let pending = fx.service.pending_settlement(&courier_id).await.unwrap();
        assert_eq!(pending.len(), 2);

        fx.service.settle(&[a, b]).await.unwrap();
        let pending = fx.service.pending_settlement(&courier_id).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_settle_batch() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let a = delivered_order(&fx, &courier_id, 100.0).await;
        let b = delivered_order(&fx, &courier_id, 250.0).await;

        fx.clock.advance(60_000);
        let summary = fx.service.settle(&[a.clone(), b.clone()]).await.unwrap();

        assert_eq!(summary.order_count, 2);
        assert_eq!(summary.commission_total, 35.0);

        for id in [a, b] {
            let order = fx.store.get_order(&id).await.unwrap().unwrap();
            let delivery = order.delivery.unwrap();
            assert!(delivery.settled);
            assert_eq!(delivery.settled_at, Some(NOON + 60_000));
        }
    }

    #[tokio::test]
    async fn test_settle_is_all_or_nothing() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let a = delivered_order(&fx, &courier_id, 100.0).await;
        let b = delivered_order(&fx, &courier_id, 200.0).await;

        // Settle A alone, then try A+B: the whole batch must fail
        fx.service.settle(std::slice::from_ref(&a)).await.unwrap();
        let err = fx.service.settle(&[a, b.clone()]).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadySettled(_)));

        // B remains unsettled - no partial effect
        let order_b = fx.store.get_order(&b).await.unwrap().unwrap();
        assert!(!order_b.delivery.unwrap().settled);
    }

    #[tokio::test]
    async fn test_settle_rejects_undelivered() {
        let fx = fixture();
        let courier_id = seed_courier(&fx, 10.0, true).await;
        let order_id = seed_order(&fx, OrderStatus::Ready, 100.0).await;
        fx.service.assign(&order_id, &courier_id).await.unwrap();

        let err = fx.service.settle(&[order_id]).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_settle_rejects_mixed_couriers() {
        let fx = fixture();
        let first = seed_courier(&fx, 10.0, true).await;
        let second = seed_courier(&fx, 20.0, true).await;
        let a = delivered_order(&fx, &first, 100.0).await;
        let b = delivered_order(&fx, &second, 100.0).await;

        let err = fx.service.settle(&[a, b]).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
