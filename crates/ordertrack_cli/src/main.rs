//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `ordertrack_core` linkage and print the core version.
//! - Seed a small demo dataset and print one query page plus analytics as JSON.
//!
//! Usage: `ordertrack_cli [config.json]`. Without a config file the in-memory
//! store and default limits are used.

use log::{info, warn};
use ordertrack_core::{
    CoreConfig, InMemoryOrderStore, NewOrder, OrderApi, OrderStatus, OrderStore, OrderUpdate,
    QueryParams, SqliteOrderStore,
};
use rust_decimal::Decimal;
use std::error::Error;

const DEMO_ORDERS: [(&str, &str, i64, OrderStatus); 5] = [
    ("John Smith", "john@example.com", 129_999, OrderStatus::Completed),
    ("Sarah Johnson", "sarah@example.com", 59_950, OrderStatus::Processing),
    ("Mike Wilson", "mike@example.com", 215_000, OrderStatus::Pending),
    ("Emily Davis", "emily@example.com", 79_999, OrderStatus::Completed),
    ("Robert Brown", "robert@example.com", 159_900, OrderStatus::Cancelled),
];

fn main() -> Result<(), Box<dyn Error>> {
    println!("ordertrack_core ping={}", ordertrack_core::ping());
    println!("ordertrack_core version={}", ordertrack_core::core_version());

    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::from_file(path)?,
        None => CoreConfig::default(),
    };
    ordertrack_core::init_logging_from_config(&config)?;

    match config.database_path.clone() {
        Some(path) => run(OrderApi::new(SqliteOrderStore::open(path)?, config)?),
        None => run(OrderApi::new(InMemoryOrderStore::new(), config)?),
    }
}

fn run<S: OrderStore>(api: OrderApi<S>) -> Result<(), Box<dyn Error>> {
    if api.orders().store().is_empty()? {
        seed_demo_orders(&api);
    }

    let completed = api.list_orders(QueryParams {
        status: Some(OrderStatus::Completed.as_str().to_string()),
        sort_by: Some("orderAmount".to_string()),
        sort_order: Some("desc".to_string()),
        ..QueryParams::default()
    });
    println!("{}", serde_json::to_string_pretty(&completed)?);
    println!("{}", serde_json::to_string_pretty(&api.analytics())?);
    Ok(())
}

/// Seeds the demo dataset; returns how many steps the API rejected.
fn seed_demo_orders<S: OrderStore>(api: &OrderApi<S>) -> usize {
    let mut rejected = 0;
    for (name, email, cents, status) in DEMO_ORDERS {
        let mut input = NewOrder::new(name, Decimal::new(cents, 2));
        input.customer_email = Some(email.to_string());
        let created = api.create_order(input);
        let Some(order) = created.data else {
            warn!(
                "event=demo_seed module=cli status=skipped step=create message={}",
                created.message
            );
            rejected += 1;
            continue;
        };
        if status == OrderStatus::Pending {
            continue;
        }
        let updated = api.update_order(order.order_id.as_str(), OrderUpdate::status(status));
        if !updated.success {
            warn!(
                "event=demo_seed module=cli status=skipped step=update order_id={} message={}",
                order.order_id, updated.message
            );
            rejected += 1;
        }
    }
    info!(
        "event=demo_seed module=cli status=ok orders={} rejected={rejected}",
        DEMO_ORDERS.len()
    );
    rejected
}
