use chrono::{TimeZone, Utc};
use ordertrack_core::{
    analytics_for, compute_analytics, InMemoryOrderStore, Order, OrderId, OrderStatus,
    OrderStore, StoreHandle,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn sample_orders() -> Vec<Order> {
    let rows = [
        ("ORD-1", "John Smith", dec!(1299.99), OrderStatus::Completed, 1),
        ("ORD-2", "Sarah Johnson", dec!(599.50), OrderStatus::Processing, 1),
        ("ORD-3", "Mike Wilson", dec!(2150.00), OrderStatus::Pending, 2),
        ("ORD-4", "Emily Davis", dec!(799.99), OrderStatus::Completed, 2),
        ("ORD-5", "Robert Brown", dec!(1599.00), OrderStatus::Cancelled, 3),
    ];
    rows.into_iter()
        .map(|(id, name, amount, status, month)| {
            let date = Utc.with_ymd_and_hms(2024, month, 10, 9, 30, 0).unwrap();
            let mut order = Order::new(OrderId::new(id), name, amount, date, date);
            order.status = status;
            order
        })
        .collect()
}

#[test]
fn sample_totals_match_expected_figures() {
    let snapshot = compute_analytics(&sample_orders());
    assert_eq!(snapshot.total_orders, 5);
    assert_eq!(snapshot.total_revenue, dec!(2099.98));
    assert_eq!(snapshot.completion_rate, 40.0);
    assert_eq!(
        snapshot.average_order_value,
        dec!(2099.98) / Decimal::from(5)
    );
}

#[test]
fn status_breakdown_sums_to_total() {
    let snapshot = compute_analytics(&sample_orders());
    let sum: usize = snapshot.status_breakdown.values().sum();
    assert_eq!(sum, snapshot.total_orders);
    for status in OrderStatus::ALL {
        assert!(snapshot.status_breakdown.contains_key(&status));
    }
    assert_eq!(snapshot.count_for(OrderStatus::Completed), 2);
    assert_eq!(snapshot.count_for(OrderStatus::Pending), 1);
}

#[test]
fn revenue_by_month_counts_all_but_sums_completed() {
    let snapshot = compute_analytics(&sample_orders());
    let rows: Vec<(&str, Decimal, usize)> = snapshot
        .revenue_by_month
        .iter()
        .map(|bucket| (bucket.month.as_str(), bucket.revenue, bucket.orders))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2024-01", dec!(1299.99), 2),
            ("2024-02", dec!(799.99), 2),
            ("2024-03", Decimal::ZERO, 1),
        ]
    );
}

#[test]
fn top_customers_rank_by_completed_revenue() {
    let mut orders = sample_orders();
    let date = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
    let mut repeat = Order::new(OrderId::new("ORD-6"), "Emily Davis", dec!(700), date, date);
    repeat.status = OrderStatus::Completed;
    orders.push(repeat);

    let snapshot = compute_analytics(&orders);
    let leader = &snapshot.top_customers[0];
    assert_eq!(leader.customer_name, "Emily Davis");
    assert_eq!(leader.total_orders, 2);
    assert_eq!(leader.total_revenue, dec!(1499.99));
    assert!(snapshot
        .top_customers
        .windows(2)
        .all(|pair| pair[0].total_revenue >= pair[1].total_revenue));

    let zero_revenue: Vec<&str> = snapshot
        .top_customers
        .iter()
        .filter(|customer| customer.total_revenue == Decimal::ZERO)
        .map(|customer| customer.customer_name.as_str())
        .collect();
    assert_eq!(zero_revenue, vec!["Sarah Johnson", "Mike Wilson", "Robert Brown"]);
}

#[test]
fn top_customers_are_capped() {
    let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let orders: Vec<Order> = (1..=15)
        .map(|n| {
            Order::new(
                OrderId::new(format!("ORD-{n}")),
                format!("Customer {n}"),
                dec!(10),
                date,
                date,
            )
        })
        .collect();
    assert_eq!(compute_analytics(&orders).top_customers.len(), 10);
}

#[test]
fn empty_store_has_zero_completion_rate() {
    let handle = StoreHandle::new(InMemoryOrderStore::new());
    let snapshot = analytics_for(&handle, 10).unwrap();
    assert_eq!(snapshot.total_orders, 0);
    assert_eq!(snapshot.completion_rate, 0.0);
    assert_eq!(snapshot.total_revenue, Decimal::ZERO);
}

#[test]
fn analytics_serializes_with_camel_case_keys() {
    let handle = StoreHandle::new(InMemoryOrderStore::new());
    {
        let mut store = handle.lock().unwrap();
        for order in sample_orders() {
            store.upsert(order).unwrap();
        }
    }
    let snapshot = analytics_for(&handle, 10).unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["totalOrders"], 5);
    assert_eq!(json["statusBreakdown"]["cancelled"], 1);
    assert_eq!(json["revenueByMonth"][0]["month"], "2024-01");
    assert!(json["topCustomers"].is_array());
}
