//! Shift Ledger
//!
//! Opens and seals cash shifts and accumulates running totals as orders
//! complete. Totals are additive only: an order counts toward its
//! shift's totals exactly once, when it reaches DELIVERED, and a later
//! cancellation of some other order never subtracts anything.
//!
//! Variance at close: `counted - (starting_cash + cash total)`.
//! Positive = surplus, negative = shortage; both are valid outcomes,
//! never errors.

use std::sync::Arc;

use shared::models::order::{Order, OrderStatus};
use shared::models::shift::{Shift, ShiftClose, ShiftClosing, ShiftOpen, ShiftStatus};
use shared::order::event::{NotificationEvent, NotificationPayload, Role};
use shared::{DomainError, DomainResult};

use crate::clock::Clock;
use crate::notify::{NotificationSink, emit};
use crate::pricing::money::require_finite;
use crate::pricing::{to_decimal, to_f64};
use crate::store::{ShiftStore, Store};

/// Attempts for read-modify-write loops before surfacing `Conflict`
const MAX_CAS_RETRIES: usize = 3;

pub struct ShiftLedger {
    store: Arc<dyn Store>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl ShiftLedger {
    pub fn new(
        store: Arc<dyn Store>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, sink, clock }
    }

    /// Open a new shift; fails `ShiftAlreadyOpen` when one is open
    pub async fn open(&self, req: ShiftOpen) -> DomainResult<Shift> {
        require_finite(req.starting_cash, "starting_cash")?;
        if req.starting_cash < 0.0 {
            return Err(DomainError::validation(format!(
                "starting_cash must be non-negative, got {}",
                req.starting_cash
            )));
        }

        if self.store.find_open_shift().await?.is_some() {
            return Err(DomainError::ShiftAlreadyOpen);
        }

        let shift = Shift {
            id: None,
            kind: req.kind,
            status: ShiftStatus::Open,
            opened_at: self.clock.now_millis(),
            cashier_id: req.cashier_id,
            manager_id: req.manager_id,
            starting_cash: req.starting_cash,
            totals: Default::default(),
            counters: Default::default(),
            closing: None,
            abnormal_close: false,
            note: req.note,
            version: 0,
        };

        // The store re-checks uniqueness transactionally
        let shift = self.store.create_shift(shift).await?;
        let shift_id = shift.id.clone().unwrap_or_default();
        tracing::info!(shift_id = %shift_id, kind = ?shift.kind, "shift opened");

        emit(
            self.sink.as_ref(),
            NotificationEvent::for_shift(
                vec![Role::Counter, Role::Admin],
                self.clock.now_millis(),
                NotificationPayload::ShiftOpened {
                    shift_id,
                    kind: shift.kind,
                },
            ),
        );
        Ok(shift)
    }

    /// Close a shift with a cash count, sealing it
    pub async fn close(&self, shift_id: &str, req: ShiftClose) -> DomainResult<Shift> {
        require_finite(req.counted_cash, "counted_cash")?;
        if req.counted_cash < 0.0 {
            return Err(DomainError::validation(format!(
                "counted_cash must be non-negative, got {}",
                req.counted_cash
            )));
        }

        let shift = self.load_open(shift_id).await?;

        let expected = to_decimal(shift.starting_cash) + to_decimal(shift.totals.cash);
        let variance = to_decimal(req.counted_cash) - expected;

        let mut sealed = shift;
        sealed.status = ShiftStatus::Closed;
        sealed.closing = Some(ShiftClosing {
            counted_cash: req.counted_cash,
            expected_cash: to_f64(expected),
            variance: to_f64(variance),
            observations: req.observations,
            closed_by: req.closed_by,
            closed_at: self.clock.now_millis(),
        });

        let sealed = self.store.update_shift(&sealed).await?;
        tracing::info!(
            shift_id = %shift_id,
            expected = to_f64(expected),
            counted = req.counted_cash,
            variance = to_f64(variance),
            "shift closed"
        );

        emit(
            self.sink.as_ref(),
            NotificationEvent::for_shift(
                vec![Role::Admin],
                self.clock.now_millis(),
                NotificationPayload::ShiftClosed {
                    shift_id: shift_id.to_string(),
                    variance: to_f64(variance),
                },
            ),
        );
        Ok(sealed)
    }

    /// Abnormal close without a cash count (power failure, crash)
    pub async fn force_close(&self, shift_id: &str, note: Option<String>) -> DomainResult<Shift> {
        let shift = self.load_open(shift_id).await?;

        let mut sealed = shift;
        sealed.status = ShiftStatus::Closed;
        sealed.abnormal_close = true;
        if note.is_some() {
            sealed.note = note;
        }

        let sealed = self.store.update_shift(&sealed).await?;
        tracing::warn!(shift_id = %shift_id, "shift force-closed without cash count");
        Ok(sealed)
    }

    /// Bump the received counter when an order is created under a shift
    pub async fn record_order_created(&self, shift_id: &str) -> DomainResult<Shift> {
        self.mutate_open(shift_id, |shift| {
            shift.counters.received += 1;
            Ok(())
        })
        .await
    }

    /// Add a delivered order's total to its payment-method bucket
    ///
    /// The order must actually be DELIVERED: this is the only point an
    /// order is counted, so cancellations never need subtracting.
    pub async fn record_order_completion(
        &self,
        shift_id: &str,
        order: &Order,
    ) -> DomainResult<Shift> {
        if order.status != OrderStatus::Delivered {
            return Err(DomainError::invalid_state(format!(
                "order {} is {}, only DELIVERED orders are recorded",
                order.receipt_number, order.status
            )));
        }

        let method = order.payment.method;
        let amount = order.totals.total;
        let shift = self
            .mutate_open(shift_id, |shift| {
                let bucket = shift.totals.bucket_mut(method);
                *bucket = to_f64(to_decimal(*bucket) + to_decimal(amount));
                shift.counters.delivered += 1;
                Ok(())
            })
            .await?;

        tracing::info!(
            shift_id = %shift_id,
            receipt = %order.receipt_number,
            method = ?method,
            amount,
            "order recorded against shift"
        );
        Ok(shift)
    }

    /// Bump the cancelled counter
    pub async fn record_order_cancelled(&self, shift_id: &str) -> DomainResult<Shift> {
        self.mutate_open(shift_id, |shift| {
            shift.counters.cancelled += 1;
            Ok(())
        })
        .await
    }

    async fn load_open(&self, shift_id: &str) -> DomainResult<Shift> {
        let shift = self
            .store
            .get_shift(shift_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shift {}", shift_id)))?;
        if shift.status == ShiftStatus::Closed {
            return Err(DomainError::ShiftAlreadyClosed(shift_id.to_string()));
        }
        Ok(shift)
    }

    /// Read-modify-write with a bounded retry on CAS conflicts
    async fn mutate_open<F>(&self, shift_id: &str, mutate: F) -> DomainResult<Shift>
    where
        F: Fn(&mut Shift) -> DomainResult<()>,
    {
        let mut last_err = DomainError::conflict(format!("shift {}", shift_id));
        for _ in 0..MAX_CAS_RETRIES {
            let mut shift = self.load_open(shift_id).await?;
            mutate(&mut shift)?;
            match self.store.update_shift(&shift).await {
                Ok(updated) => return Ok(updated),
                Err(DomainError::Conflict(msg)) => {
                    last_err = DomainError::Conflict(msg);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err)
    }
}
