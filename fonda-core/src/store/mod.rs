//! Persistence collaborator traits
//!
//! The core owns no storage engine. It requires typed CRUD, predicate
//! queries, a subscribe-for-full-snapshot stream, and two transactional
//! primitives: the per-date receipt counter and single-open-shift
//! uniqueness. Updates are compare-and-swap on the document `version`;
//! a mismatch surfaces as `Conflict` and the caller retries with fresh
//! state.

pub mod memory;

use async_trait::async_trait;
use shared::DomainResult;
use shared::models::{Courier, Neighborhood, Order, OrderStatus, Shift};
use tokio::sync::mpsc;

pub use memory::MemoryStore;

/// Predicate for order queries and subscriptions
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub statuses: Option<Vec<OrderStatus>>,
    pub shift_id: Option<String>,
    pub courier_id: Option<String>,
    /// Inclusive lower bound on created_at (Unix millis)
    pub created_from: Option<i64>,
    /// Exclusive upper bound on created_at (Unix millis)
    pub created_until: Option<i64>,
    /// Filter on the delivery settlement flag
    pub settled: Option<bool>,
}

impl OrderFilter {
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn for_shift(mut self, shift_id: impl Into<String>) -> Self {
        self.shift_id = Some(shift_id.into());
        self
    }

    pub fn for_courier(mut self, courier_id: impl Into<String>) -> Self {
        self.courier_id = Some(courier_id.into());
        self
    }

    /// Half-open creation-time range `[from, until)`
    pub fn created_between(mut self, from: i64, until: i64) -> Self {
        self.created_from = Some(from);
        self.created_until = Some(until);
        self
    }

    pub fn settled(mut self, settled: bool) -> Self {
        self.settled = Some(settled);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        if let Some(statuses) = &self.statuses
            && !statuses.contains(&order.status)
        {
            return false;
        }
        if let Some(shift_id) = &self.shift_id
            && order.shift_id != *shift_id
        {
            return false;
        }
        if let Some(courier_id) = &self.courier_id {
            match &order.delivery {
                Some(d) if d.courier_id == *courier_id => {}
                _ => return false,
            }
        }
        if let Some(from) = self.created_from
            && order.created_at < from
        {
            return false;
        }
        if let Some(until) = self.created_until
            && order.created_at >= until
        {
            return false;
        }
        if let Some(settled) = self.settled {
            match &order.delivery {
                Some(d) if d.settled == settled => {}
                _ => return false,
            }
        }
        true
    }
}

/// Stream of full refreshed result sets
///
/// Every emission is the authoritative current answer to the filter,
/// not a delta. Last write wins; there is no diffing contract.
pub type OrderSubscription = mpsc::UnboundedReceiver<Vec<Order>>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order; assigns the id and initial version
    async fn create_order(&self, order: Order) -> DomainResult<Order>;

    async fn get_order(&self, id: &str) -> DomainResult<Option<Order>>;

    /// Compare-and-swap on `version`; mismatch → `Conflict`
    async fn update_order(&self, order: &Order) -> DomainResult<Order>;

    async fn query_orders(&self, filter: &OrderFilter) -> DomainResult<Vec<Order>>;

    /// Register an observer; receives the current result set immediately
    /// and the full refreshed set after every matching change
    async fn subscribe_orders(&self, filter: OrderFilter) -> DomainResult<OrderSubscription>;
}

#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Persist a new shift; fails `ShiftAlreadyOpen` when an OPEN shift
    /// exists (the store's uniqueness guarantee)
    async fn create_shift(&self, shift: Shift) -> DomainResult<Shift>;

    async fn get_shift(&self, id: &str) -> DomainResult<Option<Shift>>;

    /// Compare-and-swap on `version`; mismatch → `Conflict`
    async fn update_shift(&self, shift: &Shift) -> DomainResult<Shift>;

    async fn find_open_shift(&self) -> DomainResult<Option<Shift>>;

    async fn list_shifts(&self) -> DomainResult<Vec<Shift>>;
}

#[async_trait]
pub trait CourierStore: Send + Sync {
    async fn create_courier(&self, courier: Courier) -> DomainResult<Courier>;

    async fn get_courier(&self, id: &str) -> DomainResult<Option<Courier>>;
}

#[async_trait]
pub trait NeighborhoodStore: Send + Sync {
    async fn create_neighborhood(&self, neighborhood: Neighborhood)
    -> DomainResult<Neighborhood>;

    /// Look up a neighborhood by name, active ones only
    async fn find_active_neighborhood(&self, name: &str) -> DomainResult<Option<Neighborhood>>;
}

#[async_trait]
pub trait ReceiptCounter: Send + Sync {
    /// Next sequence for a date key (`YYYYMMDD`): atomic, monotonic,
    /// gap-free per key, starts at 1. Two concurrent callers on the same
    /// key must never receive the same value.
    async fn next_receipt_seq(&self, date_key: &str) -> DomainResult<u32>;
}

/// Everything the workflow core needs from the persistence collaborator
pub trait Store:
    OrderStore + ShiftStore + CourierStore + NeighborhoodStore + ReceiptCounter
{
}

impl<T> Store for T where
    T: OrderStore + ShiftStore + CourierStore + NeighborhoodStore + ReceiptCounter
{
}
