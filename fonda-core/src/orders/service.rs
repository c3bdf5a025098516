//! Order lifecycle service
//!
//! Creates orders against an explicitly supplied open shift and drives
//! status transitions. The shift is a parameter, never ambient state:
//! callers fetch the current shift through the store and pass it in.

use std::sync::Arc;

use shared::models::order::{
    Order, OrderCreate, OrderPayment, OrderStatus, PaymentMethod,
};
use shared::models::shift::Shift;
use shared::order::event::{NotificationEvent, NotificationPayload, Role};
use shared::{DomainError, DomainResult};

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::notify::{NotificationSink, emit};
use crate::orders::{machine, receipt};
use crate::pricing;
use crate::pricing::money::validate_payment;
use crate::shifts::ShiftLedger;
use crate::store::{NeighborhoodStore, OrderStore, Store};
use crate::utils::time::business_date;

pub struct OrderService {
    store: Arc<dyn Store>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
    ledger: ShiftLedger,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn Store>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        let ledger = ShiftLedger::new(store.clone(), sink.clone(), clock.clone());
        Self {
            store,
            sink,
            clock,
            config,
            ledger,
        }
    }

    /// Create an order in RECEIVED against the given open shift
    pub async fn create(&self, shift: &Shift, req: OrderCreate) -> DomainResult<Order> {
        if !shift.is_open() {
            return Err(DomainError::NoOpenShift);
        }
        let shift_id = shift
            .id
            .clone()
            .ok_or_else(|| DomainError::validation("shift has no id"))?;

        validate_payment(&req.payment)?;

        // Shipping is copied from the active neighborhood at creation;
        // later price changes leave this order untouched
        let shipping = match &req.customer.neighborhood {
            Some(name) => {
                let neighborhood = self
                    .store
                    .find_active_neighborhood(name)
                    .await?
                    .ok_or_else(|| {
                        DomainError::validation(format!(
                            "neighborhood '{}' is unknown or inactive",
                            name
                        ))
                    })?;
                neighborhood.shipping_cost
            }
            None => 0.0,
        };

        let (items, totals) =
            pricing::compute_totals(&req.items, req.discount.as_ref(), shipping)?;

        let payment = match req.payment.tendered {
            Some(tendered) if req.payment.method == PaymentMethod::Cash => OrderPayment {
                method: req.payment.method,
                requires_change: true,
                tendered: Some(tendered),
                change_due: Some(pricing::change_due(totals.total, tendered)?),
            },
            _ => OrderPayment {
                method: req.payment.method,
                requires_change: false,
                tendered: None,
                change_due: None,
            },
        };

        let now = self.clock.now_millis();
        let date = business_date(now, self.config.day_cutoff, self.config.timezone);
        let receipt_number = receipt::allocate(self.store.as_ref(), date).await?;

        let order = Order {
            id: None,
            receipt_number,
            channel: req.channel,
            customer: req.customer,
            items,
            totals,
            payment,
            status: OrderStatus::Received,
            delivery: None,
            note: req.note,
            customer_note: req.customer_note,
            shift_id: shift_id.clone(),
            created_at: now,
            version: 0,
        };

        let order = self.store.create_order(order).await?;
        tracing::info!(
            receipt = %order.receipt_number,
            channel = %order.channel,
            total = order.totals.total,
            "order created"
        );

        // Best-effort registration; the order itself is already durable
        if let Err(e) = self.ledger.record_order_created(&shift_id).await {
            tracing::warn!(shift_id = %shift_id, error = %e, "failed to register order on shift");
        }

        emit(
            self.sink.as_ref(),
            NotificationEvent::new(
                order.id.clone().unwrap_or_default(),
                order.receipt_number.clone(),
                vec![Role::Kitchen, Role::Counter],
                now,
                NotificationPayload::OrderCreated {
                    channel: order.channel,
                    total: order.totals.total,
                },
            ),
        );

        Ok(order)
    }

    /// Apply a status transition
    ///
    /// Cancelling an already-cancelled order is a no-op, not an error.
    /// Reaching DELIVERED records the order against its shift's totals.
    pub async fn transition(&self, order_id: &str, target: OrderStatus) -> DomainResult<Order> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("order {}", order_id)))?;

        // Idempotent cancellation
        if target == OrderStatus::Cancelled && order.status == OrderStatus::Cancelled {
            return Ok(order);
        }

        machine::validate_transition(&order, target)?;
        let from = order.status;

        let mut updated = order;
        updated.status = target;
        let updated = self.store.update_order(&updated).await?;

        tracing::info!(
            receipt = %updated.receipt_number,
            from = %from,
            to = %target,
            "order transitioned"
        );

        // Shift bookkeeping is a separate write; a failure here is logged
        // and never rolls back the transition (documented consistency gap)
        match target {
            OrderStatus::Delivered => {
                if let Err(e) = self
                    .ledger
                    .record_order_completion(&updated.shift_id, &updated)
                    .await
                {
                    tracing::error!(
                        receipt = %updated.receipt_number,
                        shift_id = %updated.shift_id,
                        error = %e,
                        "failed to record completion on shift"
                    );
                }
            }
            OrderStatus::Cancelled => {
                if let Err(e) = self.ledger.record_order_cancelled(&updated.shift_id).await {
                    tracing::warn!(
                        receipt = %updated.receipt_number,
                        shift_id = %updated.shift_id,
                        error = %e,
                        "failed to record cancellation on shift"
                    );
                }
            }
            _ => {}
        }

        emit(
            self.sink.as_ref(),
            NotificationEvent::new(
                updated.id.clone().unwrap_or_default(),
                updated.receipt_number.clone(),
                machine::audience_for(from, target),
                self.clock.now_millis(),
                NotificationPayload::StatusChanged { from, to: target },
            ),
        );

        Ok(updated)
    }
}
