//! In-memory store
//!
//! Reference implementation of the store traits, used by unit and
//! integration tests. Semantics match what a hosted document store is
//! expected to provide: CAS updates on `version`, an atomic per-key
//! counter, single-open-shift uniqueness, and full-snapshot
//! subscriptions.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use shared::models::{Courier, Neighborhood, Order, Shift, ShiftStatus};
use shared::{DomainError, DomainResult};
use tokio::sync::mpsc;

use super::{
    CourierStore, NeighborhoodStore, OrderFilter, OrderStore, OrderSubscription, ReceiptCounter,
    ShiftStore,
};

struct OrderWatcher {
    filter: OrderFilter,
    sender: mpsc::UnboundedSender<Vec<Order>>,
}

#[derive(Default)]
pub struct MemoryStore {
    orders: DashMap<String, Order>,
    shifts: DashMap<String, Shift>,
    couriers: DashMap<String, Courier>,
    neighborhoods: DashMap<String, Neighborhood>,
    /// Receipt sequence per date key; keys never repeat across days, so
    /// a fresh key is the date rollover reset
    counters: Mutex<HashMap<String, u32>>,
    watchers: Mutex<Vec<OrderWatcher>>,
    /// Serializes open-shift uniqueness checks against inserts
    shift_gate: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, filter: &OrderFilter) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.receipt_number.cmp(&b.receipt_number))
        });
        orders
    }

    /// Push the full refreshed result set to every live watcher
    fn publish(&self) {
        let mut watchers = self.watchers.lock();
        watchers.retain(|w| {
            let snapshot = self.snapshot(&w.filter);
            w.sender.send(snapshot).is_ok()
        });
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, mut order: Order) -> DomainResult<Order> {
        let id = order
            .id
            .clone()
            .unwrap_or_else(shared::util::new_id);
        order.id = Some(id.clone());
        order.version = 1;
        match self.orders.entry(id) {
            Entry::Occupied(entry) => {
                return Err(DomainError::conflict(format!(
                    "order {} already exists",
                    entry.key()
                )));
            }
            Entry::Vacant(entry) => {
                entry.insert(order.clone());
            }
        }
        self.publish();
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> DomainResult<Option<Order>> {
        Ok(self.orders.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_order(&self, order: &Order) -> DomainResult<Order> {
        let id = order
            .id
            .as_deref()
            .ok_or_else(|| DomainError::validation("order has no id"))?;

        let updated = {
            let mut entry = self
                .orders
                .get_mut(id)
                .ok_or_else(|| DomainError::not_found(format!("order {}", id)))?;
            if entry.version != order.version {
                return Err(DomainError::conflict(format!(
                    "order {} version {} != stored {}",
                    id, order.version, entry.version
                )));
            }
            let mut updated = order.clone();
            updated.version += 1;
            *entry = updated.clone();
            updated
        };

        self.publish();
        Ok(updated)
    }

    async fn query_orders(&self, filter: &OrderFilter) -> DomainResult<Vec<Order>> {
        Ok(self.snapshot(filter))
    }

    async fn subscribe_orders(&self, filter: OrderFilter) -> DomainResult<OrderSubscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        // Initial emission so observers start from the authoritative set
        let _ = sender.send(self.snapshot(&filter));
        self.watchers.lock().push(OrderWatcher { filter, sender });
        Ok(receiver)
    }
}

#[async_trait]
impl ShiftStore for MemoryStore {
    async fn create_shift(&self, mut shift: Shift) -> DomainResult<Shift> {
        let _gate = self.shift_gate.lock();
        let open_exists = self
            .shifts
            .iter()
            .any(|entry| entry.value().status == ShiftStatus::Open);
        if shift.status == ShiftStatus::Open && open_exists {
            return Err(DomainError::ShiftAlreadyOpen);
        }

        let id = shift
            .id
            .clone()
            .unwrap_or_else(shared::util::new_id);
        if self.shifts.contains_key(&id) {
            return Err(DomainError::conflict(format!("shift {} already exists", id)));
        }
        shift.id = Some(id.clone());
        shift.version = 1;
        self.shifts.insert(id, shift.clone());
        Ok(shift)
    }

    async fn get_shift(&self, id: &str) -> DomainResult<Option<Shift>> {
        Ok(self.shifts.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_shift(&self, shift: &Shift) -> DomainResult<Shift> {
        let id = shift
            .id
            .as_deref()
            .ok_or_else(|| DomainError::validation("shift has no id"))?;

        let mut entry = self
            .shifts
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("shift {}", id)))?;
        if entry.version != shift.version {
            return Err(DomainError::conflict(format!(
                "shift {} version {} != stored {}",
                id, shift.version, entry.version
            )));
        }
        let mut updated = shift.clone();
        updated.version += 1;
        *entry = updated.clone();
        Ok(updated)
    }

    async fn find_open_shift(&self) -> DomainResult<Option<Shift>> {
        Ok(self
            .shifts
            .iter()
            .find(|entry| entry.value().status == ShiftStatus::Open)
            .map(|entry| entry.value().clone()))
    }

    async fn list_shifts(&self) -> DomainResult<Vec<Shift>> {
        let mut shifts: Vec<Shift> = self.shifts.iter().map(|e| e.value().clone()).collect();
        shifts.sort_by_key(|s| s.opened_at);
        Ok(shifts)
    }
}

#[async_trait]
impl CourierStore for MemoryStore {
    async fn create_courier(&self, mut courier: Courier) -> DomainResult<Courier> {
        let id = courier
            .id
            .clone()
            .unwrap_or_else(shared::util::new_id);
        courier.id = Some(id.clone());
        self.couriers.insert(id, courier.clone());
        Ok(courier)
    }

    async fn get_courier(&self, id: &str) -> DomainResult<Option<Courier>> {
        Ok(self.couriers.get(id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl NeighborhoodStore for MemoryStore {
    async fn create_neighborhood(
        &self,
        mut neighborhood: Neighborhood,
    ) -> DomainResult<Neighborhood> {
        let id = neighborhood
            .id
            .clone()
            .unwrap_or_else(shared::util::new_id);
        neighborhood.id = Some(id.clone());
        self.neighborhoods.insert(id, neighborhood.clone());
        Ok(neighborhood)
    }

    async fn find_active_neighborhood(&self, name: &str) -> DomainResult<Option<Neighborhood>> {
        Ok(self
            .neighborhoods
            .iter()
            .find(|entry| entry.value().is_active && entry.value().name == name)
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl ReceiptCounter for MemoryStore {
    async fn next_receipt_seq(&self, date_key: &str) -> DomainResult<u32> {
        let mut counters = self.counters.lock();
        let seq = counters.entry(date_key.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::order::*;
    use shared::models::shift::*;

    fn sample_order() -> Order {
        Order {
            id: None,
            receipt_number: "20250101-0001".to_string(),
            channel: Channel::Counter,
            customer: CustomerSnapshot {
                name: "Ana".to_string(),
                phone: "5550000000".to_string(),
                address: None,
                neighborhood: None,
            },
            items: vec![],
            totals: OrderTotals::default(),
            payment: OrderPayment {
                method: PaymentMethod::Cash,
                requires_change: false,
                tendered: None,
                change_due: None,
            },
            status: OrderStatus::Received,
            delivery: None,
            note: None,
            customer_note: None,
            shift_id: "shift-1".to_string(),
            created_at: 100,
            version: 0,
        }
    }

    fn sample_shift() -> Shift {
        Shift {
            id: None,
            kind: ShiftKind::Morning,
            status: ShiftStatus::Open,
            opened_at: 0,
            cashier_id: "cashier-1".to_string(),
            manager_id: "manager-1".to_string(),
            starting_cash: 500.0,
            totals: PaymentTotals::default(),
            counters: OrderCounters::default(),
            closing: None,
            abnormal_close: false,
            note: None,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_version() {
        let store = MemoryStore::new();
        let order = store.create_order(sample_order()).await.unwrap();
        assert!(order.id.is_some());
        assert_eq!(order.version, 1);
    }

    #[tokio::test]
    async fn test_update_cas_rejects_stale_version() {
        let store = MemoryStore::new();
        let order = store.create_order(sample_order()).await.unwrap();

        let mut first = order.clone();
        first.note = Some("first".to_string());
        store.update_order(&first).await.unwrap();

        // Second writer still holds version 1 → conflict
        let mut stale = order.clone();
        stale.note = Some("stale".to_string());
        let err = store.update_order(&stale).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_single_open_shift_enforced() {
        let store = MemoryStore::new();
        store.create_shift(sample_shift()).await.unwrap();
        let err = store.create_shift(sample_shift()).await.unwrap_err();
        assert_eq!(err, DomainError::ShiftAlreadyOpen);
    }

    #[tokio::test]
    async fn test_counter_is_per_key() {
        let store = MemoryStore::new();
        assert_eq!(store.next_receipt_seq("20250101").await.unwrap(), 1);
        assert_eq!(store.next_receipt_seq("20250101").await.unwrap(), 2);
        // New date key starts over at 1
        assert_eq!(store.next_receipt_seq("20250102").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_subscription_emits_full_snapshots() {
        let store = MemoryStore::new();
        let mut sub = store
            .subscribe_orders(OrderFilter::default())
            .await
            .unwrap();

        // Initial snapshot is empty
        assert_eq!(sub.recv().await.unwrap().len(), 0);

        store.create_order(sample_order()).await.unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        let mut second = sample_order();
        second.receipt_number = "20250101-0002".to_string();
        store.create_order(second).await.unwrap();
        // Full refreshed set, not a delta
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_find_active_neighborhood_skips_inactive() {
        let store = MemoryStore::new();
        store
            .create_neighborhood(Neighborhood {
                id: None,
                name: "Centro".to_string(),
                zone: "A".to_string(),
                shipping_cost: 30.0,
                is_active: false,
            })
            .await
            .unwrap();
        assert!(
            store
                .find_active_neighborhood("Centro")
                .await
                .unwrap()
                .is_none()
        );
    }
}
