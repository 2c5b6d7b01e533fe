//! Aggregate statistics over the full order set.
//!
//! # Responsibility
//! - Compute totals, status breakdown, monthly revenue and top customers.
//!
//! # Invariants
//! - Revenue only ever counts `completed` orders; order counts include all.
//! - `average_order_value` divides revenue by the count of all orders.
//! - Every status key is present in `status_breakdown`.
//! - Top-customer ties keep first-encounter order.

use crate::config::DEFAULT_TOP_CUSTOMER_LIMIT;
use crate::model::order::{Order, OrderStatus};
use crate::repo::order_repo::{OrderStore, RepoResult, StoreHandle};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Revenue and order count for one calendar month (`YYYY-MM`, UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub customer_name: String,
    pub total_orders: usize,
    pub total_revenue: Decimal,
}

/// Point-in-time aggregate view of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_orders: usize,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    /// Percentage in `0.0..=100.0`.
    pub completion_rate: f64,
    pub status_breakdown: BTreeMap<OrderStatus, usize>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub top_customers: Vec<CustomerSummary>,
}

impl AnalyticsSnapshot {
    pub fn count_for(&self, status: OrderStatus) -> usize {
        self.status_breakdown.get(&status).copied().unwrap_or(0)
    }
}

/// Computes analytics with the default top-customer cut-off.
pub fn compute_analytics(orders: &[Order]) -> AnalyticsSnapshot {
    compute_analytics_with_limit(orders, DEFAULT_TOP_CUSTOMER_LIMIT)
}

pub fn compute_analytics_with_limit(orders: &[Order], top_customers: usize) -> AnalyticsSnapshot {
    let total_orders = orders.len();
    let total_revenue = completed_revenue(orders.iter());
    let completed = orders.iter().filter(|order| order.is_completed()).count();

    let average_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        total_revenue / Decimal::from(total_orders)
    };
    let completion_rate = if total_orders == 0 {
        0.0
    } else {
        (completed * 100) as f64 / total_orders as f64
    };

    AnalyticsSnapshot {
        total_orders,
        total_revenue,
        average_order_value,
        completion_rate,
        status_breakdown: status_breakdown(orders),
        revenue_by_month: revenue_by_month(orders),
        top_customers: rank_customers(orders, top_customers),
    }
}

/// Scans the store behind `handle` and computes analytics.
pub fn analytics_for<S: OrderStore>(
    handle: &StoreHandle<S>,
    top_customers: usize,
) -> RepoResult<AnalyticsSnapshot> {
    let snapshot = handle.snapshot()?;
    Ok(compute_analytics_with_limit(&snapshot, top_customers))
}

fn completed_revenue<'a>(orders: impl Iterator<Item = &'a Order>) -> Decimal {
    orders
        .filter(|order| order.is_completed())
        .map(|order| order.order_amount)
        .sum()
}

fn status_breakdown(orders: &[Order]) -> BTreeMap<OrderStatus, usize> {
    let mut breakdown: BTreeMap<OrderStatus, usize> =
        OrderStatus::ALL.iter().map(|status| (*status, 0)).collect();
    for order in orders {
        *breakdown.entry(order.status).or_default() += 1;
    }
    breakdown
}

fn revenue_by_month(orders: &[Order]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<String, MonthlyRevenue> = BTreeMap::new();
    for order in orders {
        let key = order.order_date.format("%Y-%m").to_string();
        let bucket = months.entry(key.clone()).or_insert_with(|| MonthlyRevenue {
            month: key,
            revenue: Decimal::ZERO,
            orders: 0,
        });
        bucket.orders += 1;
        if order.is_completed() {
            bucket.revenue += order.order_amount;
        }
    }
    months.into_values().collect()
}

fn rank_customers(orders: &[Order], limit: usize) -> Vec<CustomerSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut customers: Vec<CustomerSummary> = Vec::new();
    for order in orders {
        let slot = *index
            .entry(order.customer_name.as_str())
            .or_insert_with(|| {
                customers.push(CustomerSummary {
                    customer_name: order.customer_name.clone(),
                    total_orders: 0,
                    total_revenue: Decimal::ZERO,
                });
                customers.len() - 1
            });
        let summary = &mut customers[slot];
        summary.total_orders += 1;
        if order.is_completed() {
            summary.total_revenue += order.order_amount;
        }
    }

    customers.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    customers.truncate(limit);
    customers
}

#[cfg(test)]
mod tests {
    use super::{compute_analytics, compute_analytics_with_limit};
    use crate::model::order::{Order, OrderId, OrderStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn order(id: &str, name: &str, amount: Decimal, status: OrderStatus, month: u32) -> Order {
        let date = Utc.with_ymd_and_hms(2024, month, 15, 10, 0, 0).unwrap();
        let mut order = Order::new(OrderId::new(id), name, amount, date, date);
        order.status = status;
        order
    }

    #[test]
    fn empty_set_has_zero_rates_and_full_breakdown() {
        let snapshot = compute_analytics(&[]);
        assert_eq!(snapshot.total_orders, 0);
        assert_eq!(snapshot.completion_rate, 0.0);
        assert_eq!(snapshot.average_order_value, Decimal::ZERO);
        assert_eq!(snapshot.status_breakdown.len(), 4);
        assert!(snapshot.status_breakdown.values().all(|count| *count == 0));
        assert!(snapshot.revenue_by_month.is_empty());
        assert!(snapshot.top_customers.is_empty());
    }

    #[test]
    fn monthly_buckets_are_sorted_and_count_all_orders() {
        let orders = vec![
            order("ORD-1", "A", dec!(10), OrderStatus::Completed, 3),
            order("ORD-2", "B", dec!(20), OrderStatus::Pending, 1),
            order("ORD-3", "C", dec!(30), OrderStatus::Completed, 1),
        ];
        let snapshot = compute_analytics(&orders);
        let months: Vec<&str> = snapshot
            .revenue_by_month
            .iter()
            .map(|bucket| bucket.month.as_str())
            .collect();
        assert_eq!(months, vec!["2024-01", "2024-03"]);
        assert_eq!(snapshot.revenue_by_month[0].orders, 2);
        assert_eq!(snapshot.revenue_by_month[0].revenue, dec!(30));
    }

    #[test]
    fn top_customer_ties_keep_first_encounter_and_truncate() {
        let orders = vec![
            order("ORD-1", "First", dec!(50), OrderStatus::Completed, 1),
            order("ORD-2", "Second", dec!(50), OrderStatus::Completed, 1),
            order("ORD-3", "Third", dec!(10), OrderStatus::Completed, 1),
            order("ORD-4", "First", dec!(99), OrderStatus::Cancelled, 1),
        ];
        let snapshot = compute_analytics_with_limit(&orders, 2);
        let names: Vec<&str> = snapshot
            .top_customers
            .iter()
            .map(|customer| customer.customer_name.as_str())
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(snapshot.top_customers[0].total_orders, 2);
        assert_eq!(snapshot.top_customers[0].total_revenue, dec!(50));
    }
}
