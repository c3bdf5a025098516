//! Reporting Aggregator
//!
//! Read-side only: derives day-level summaries by scanning orders for a
//! business-date range. Owns no mutable state and never writes. Revenue
//! counts DELIVERED orders exclusively; cancelled orders surface as a
//! count.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::DomainResult;
use shared::models::order::{Channel, Order, OrderStatus};
use shared::models::shift::ShiftKind;

use crate::config::CoreConfig;
use crate::pricing::{to_decimal, to_f64};
use crate::store::{OrderFilter, OrderStore, ShiftStore, Store};
use crate::utils::time::{business_day_range, hour_of_day};

/// Revenue share of one sales channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelShare {
    pub channel: Channel,
    pub revenue: f64,
    /// Percentage of total revenue (0 when there is no revenue)
    pub share_percent: f64,
}

/// Units and revenue for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductPerformance {
    pub product_id: String,
    pub name: String,
    pub units: i32,
    pub revenue: f64,
}

/// Delivery performance for one courier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourierPerformance {
    pub courier_id: String,
    pub courier_name: String,
    pub delivered: i32,
    pub revenue: f64,
    /// Mean assignment-to-delivery time; None when no order has both stamps
    pub avg_delivery_minutes: Option<f64>,
}

/// Day-level sales summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSummary {
    pub revenue: f64,
    /// Delivered order count
    pub order_count: usize,
    pub cancelled_count: usize,
    /// revenue / order_count, 0 for an empty day
    pub average_ticket: f64,
    /// Revenue per local hour of day, indices 0-23
    pub revenue_by_hour: [f64; 24],
    /// Descending by revenue
    pub by_channel: Vec<ChannelShare>,
    /// Descending by revenue, ties broken by ascending product id
    pub top_products: Vec<ProductPerformance>,
    /// Descending by delivered count, ties broken by ascending courier id
    pub couriers: Vec<CourierPerformance>,
}

/// Aggregate a set of orders into a summary
pub fn summarize(orders: &[Order], tz: Tz) -> SalesSummary {
    let delivered: Vec<&Order> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .collect();
    let cancelled_count = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Cancelled)
        .count();

    let mut revenue = Decimal::ZERO;
    let mut hour_buckets = [Decimal::ZERO; 24];
    let mut channel_revenue: HashMap<Channel, Decimal> = HashMap::new();
    let mut products: HashMap<String, (String, i32, Decimal)> = HashMap::new();
    let mut couriers: HashMap<String, (String, i32, Decimal, Vec<f64>)> = HashMap::new();

    for order in &delivered {
        let total = to_decimal(order.totals.total);
        revenue += total;

        let hour = hour_of_day(order.created_at, tz) as usize;
        hour_buckets[hour.min(23)] += total;

        *channel_revenue.entry(order.channel).or_insert(Decimal::ZERO) += total;

        for item in &order.items {
            let entry = products
                .entry(item.product_id.clone())
                .or_insert_with(|| (item.name.clone(), 0, Decimal::ZERO));
            entry.1 += item.quantity;
            entry.2 += to_decimal(item.line_total);
        }

        if let Some(delivery) = &order.delivery {
            let entry = couriers
                .entry(delivery.courier_id.clone())
                .or_insert_with(|| (delivery.courier_name.clone(), 0, Decimal::ZERO, vec![]));
            entry.1 += 1;
            entry.2 += total;
            if let Some(delivered_at) = delivery.delivered_at {
                let minutes = (delivered_at - delivery.assigned_at) as f64 / 60_000.0;
                entry.3.push(minutes);
            }
        }
    }

    let order_count = delivered.len();
    let average_ticket = if order_count > 0 {
        to_f64(revenue / Decimal::from(order_count))
    } else {
        0.0
    };

    let mut by_channel: Vec<ChannelShare> = channel_revenue
        .into_iter()
        .map(|(channel, amount)| ChannelShare {
            channel,
            revenue: to_f64(amount),
            share_percent: if revenue > Decimal::ZERO {
                to_f64(amount * Decimal::ONE_HUNDRED / revenue)
            } else {
                0.0
            },
        })
        .collect();
    by_channel.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.channel.to_string().cmp(&b.channel.to_string()))
    });

    let mut top_products: Vec<ProductPerformance> = products
        .into_iter()
        .map(|(product_id, (name, units, amount))| ProductPerformance {
            product_id,
            name,
            units,
            revenue: to_f64(amount),
        })
        .collect();
    // Deterministic ranking: revenue descending, product id ascending on ties
    top_products.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    let mut courier_rows: Vec<CourierPerformance> = couriers
        .into_iter()
        .map(|(courier_id, (courier_name, count, amount, times))| CourierPerformance {
            courier_id,
            courier_name,
            delivered: count,
            revenue: to_f64(amount),
            avg_delivery_minutes: if times.is_empty() {
                None
            } else {
                Some(times.iter().sum::<f64>() / times.len() as f64)
            },
        })
        .collect();
    courier_rows.sort_by(|a, b| {
        b.delivered
            .cmp(&a.delivered)
            .then_with(|| a.courier_id.cmp(&b.courier_id))
    });

    let mut revenue_by_hour = [0.0; 24];
    for (i, bucket) in hour_buckets.iter().enumerate() {
        revenue_by_hour[i] = to_f64(*bucket);
    }

    SalesSummary {
        revenue: to_f64(revenue),
        order_count,
        cancelled_count,
        average_ticket,
        revenue_by_hour,
        by_channel,
        top_products,
        couriers: courier_rows,
    }
}

/// Query-then-summarize convenience over the store
pub struct ReportService {
    store: Arc<dyn Store>,
    config: CoreConfig,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>, config: CoreConfig) -> Self {
        Self { store, config }
    }

    /// Summary for one business date, optionally narrowed to shifts of
    /// one kind (the "turno" view)
    pub async fn daily_summary(
        &self,
        date: NaiveDate,
        kind: Option<ShiftKind>,
    ) -> DomainResult<SalesSummary> {
        let (start, end) = business_day_range(date, self.config.day_cutoff, self.config.timezone);
        let mut orders = self
            .store
            .query_orders(&OrderFilter::default().created_between(start, end))
            .await?;

        if let Some(kind) = kind {
            let shift_ids: Vec<String> = self
                .store
                .list_shifts()
                .await?
                .into_iter()
                .filter(|s| s.kind == kind)
                .filter_map(|s| s.id)
                .collect();
            orders.retain(|o| shift_ids.contains(&o.shift_id));
        }

        tracing::debug!(
            date = %date,
            orders = orders.len(),
            "aggregating daily summary"
        );
        Ok(summarize(&orders, self.config.timezone))
    }
}
