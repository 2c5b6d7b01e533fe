use chrono::{Duration, TimeZone, Utc};
use ordertrack_core::{
    ApiResponse, CoreConfig, InMemoryOrderStore, ManualClock, NewOrder, NotificationKind,
    OrderApi, OrderStatus, OrderUpdate, QueryParams,
};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

fn api() -> (OrderApi<InMemoryOrderStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));
    let api = OrderApi::new(InMemoryOrderStore::new(), CoreConfig::default())
        .unwrap()
        .with_clock(clock.clone());
    (api, clock)
}

#[test]
fn create_returns_success_envelope_with_camel_case_order() {
    let (api, _) = api();
    let mut input = NewOrder::new("Ada", dec!(599.50));
    input.customer_email = Some("ada@example.com".to_string());

    let response = api.create_order(input);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Order created successfully");
    assert_eq!(json["data"]["orderId"], "ORD-1");
    assert_eq!(json["data"]["customerEmail"], "ada@example.com");
    assert_eq!(json["data"]["orderAmount"], "599.50");
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(
        json["data"]["notes"],
        json!(["Order received and awaiting confirmation"])
    );
}

#[test]
fn failures_omit_data_and_carry_a_message() {
    let (api, _) = api();

    let response = api.create_order(NewOrder::new("", dec!(10)));
    assert!(!response.success);
    assert!(response.data.is_none());
    let json = serde_json::to_value(&response).unwrap();
    assert!(json.get("data").is_none());
    assert!(!json["message"].as_str().unwrap().is_empty());

    let missing = api.update_order("ORD-77", OrderUpdate::status(OrderStatus::Completed));
    assert!(!missing.success);
    assert!(missing.message.contains("ORD-77"));

    let deleted = api.delete_order("ORD-77");
    assert!(!deleted.success);
}

#[test]
fn get_delete_round_trip() {
    let (api, _) = api();
    let created = api
        .create_order(NewOrder::new("Ada", dec!(10)))
        .data
        .unwrap();
    let id = created.order_id.as_str().to_string();

    let found = api.get_order(&id);
    assert!(found.success);
    assert_eq!(found.data.unwrap(), created);

    let deleted = api.delete_order(&id);
    assert!(deleted.success);
    assert_eq!(deleted.data.unwrap(), created.order_id);

    let gone: ApiResponse<_> = api.get_order(&id);
    assert!(!gone.success);
}

#[test]
fn invalid_query_params_are_rejected_with_reason() {
    let (api, _) = api();
    for params in [
        QueryParams {
            page: Some("0".to_string()),
            ..QueryParams::default()
        },
        QueryParams {
            limit: Some("101".to_string()),
            ..QueryParams::default()
        },
        QueryParams {
            status: Some("shipped".to_string()),
            ..QueryParams::default()
        },
        QueryParams {
            sort_by: Some("price".to_string()),
            ..QueryParams::default()
        },
        QueryParams {
            sort_order: Some("up".to_string()),
            ..QueryParams::default()
        },
        QueryParams {
            date_from: Some("yesterday".to_string()),
            ..QueryParams::default()
        },
        QueryParams {
            date_from: Some("2024-03-02".to_string()),
            date_to: Some("2024-03-01".to_string()),
            ..QueryParams::default()
        },
    ] {
        let response = api.list_orders(params.clone());
        assert!(!response.success, "expected rejection for {params:?}");
        assert!(response.data.is_none());
    }
}

#[test]
fn list_orders_reports_page_metadata() {
    let (api, clock) = api();
    for n in 1..=7 {
        api.create_order(NewOrder::new(format!("Customer {n}"), dec!(5)));
        clock.advance(Duration::minutes(1));
    }

    let response = api.list_orders(QueryParams {
        page: Some("2".to_string()),
        limit: Some("3".to_string()),
        ..QueryParams::default()
    });
    assert!(response.success);
    let json = serde_json::to_value(response.data.unwrap()).unwrap();
    assert_eq!(json["total"], 7);
    assert_eq!(json["page"], 2);
    assert_eq!(json["limit"], 3);
    assert_eq!(json["totalPages"], 3);
    let ids: Vec<&str> = json["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|order| order["orderId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["ORD-4", "ORD-3", "ORD-2"]);
}

#[test]
fn bulk_update_message_counts_applied_orders() {
    let (api, _) = api();
    let a = api.create_order(NewOrder::new("A", dec!(1))).data.unwrap();
    let response = api.bulk_update(
        &[a.order_id.as_str().to_string(), "ORD-missing".to_string()],
        OrderUpdate::status(OrderStatus::Cancelled),
    );
    assert!(response.success);
    assert_eq!(response.message, "Updated 1 of 2 orders");
    assert_eq!(response.data.unwrap()[0].status, OrderStatus::Cancelled);
}

#[test]
fn notifications_are_newest_first_and_can_be_marked_read() {
    let (api, _) = api();
    let order = api
        .create_order(NewOrder::new("Ada", dec!(10)))
        .data
        .unwrap();
    api.update_order(
        order.order_id.as_str(),
        OrderUpdate::status(OrderStatus::Completed),
    );

    let feed = api.notifications(10).data.unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].kind, NotificationKind::OrderUpdated);
    assert_eq!(feed[1].kind, NotificationKind::OrderCreated);

    let json = serde_json::to_value(&feed[0]).unwrap();
    assert_eq!(json["type"], "order_updated");
    assert_eq!(json["orderId"], order.order_id.as_str());

    let marked = api.mark_notification_read(&feed[0].id.to_string());
    assert!(marked.success);
    assert!(marked.data.unwrap().read);
    assert_eq!(api.notification_log().unread_count().unwrap(), 1);

    assert!(!api.mark_notification_read("not-a-uuid").success);
    assert!(
        !api
            .mark_notification_read("00000000-0000-0000-0000-000000000000")
            .success
    );
}

#[test]
fn analytics_reflect_current_store() {
    let (api, _) = api();
    let a = api
        .create_order(NewOrder::new("A", dec!(100)))
        .data
        .unwrap();
    api.create_order(NewOrder::new("B", dec!(50)));
    api.update_order(
        a.order_id.as_str(),
        OrderUpdate::status(OrderStatus::Completed),
    );

    let snapshot = api.analytics().data.unwrap();
    assert_eq!(snapshot.total_orders, 2);
    assert_eq!(snapshot.total_revenue, dec!(100));
    assert_eq!(snapshot.completion_rate, 50.0);
    assert_eq!(snapshot.average_order_value, dec!(50));
}

#[test]
fn configured_page_limits_drive_validation_and_paging() {
    let config = CoreConfig {
        default_page_limit: 4,
        max_page_limit: 6,
        notification_capacity: 5,
        ..CoreConfig::default()
    };
    let api = OrderApi::new(InMemoryOrderStore::new(), config).unwrap();
    assert_eq!(api.notification_log().capacity(), 5);
    for n in 1..=9 {
        api.create_order(NewOrder::new(format!("Customer {n}"), dec!(5)));
    }
    assert_eq!(api.notification_log().len().unwrap(), 5);

    let defaulted = api.list_orders(QueryParams::default()).data.unwrap();
    assert_eq!(defaulted.orders.len(), 4);
    assert_eq!(defaulted.limit, 4);
    assert_eq!(defaulted.total_pages, 3);

    let widest = api
        .list_orders(QueryParams {
            limit: Some("6".to_string()),
            ..QueryParams::default()
        })
        .data
        .unwrap();
    assert_eq!(widest.orders.len(), 6);
    assert_eq!(widest.limit, 6);

    let too_wide = api.list_orders(QueryParams {
        limit: Some("7".to_string()),
        ..QueryParams::default()
    });
    assert!(!too_wide.success);
    assert!(too_wide.message.contains("1..=6"));
}

#[test]
fn out_of_range_config_limits_are_clamped_consistently() {
    let config = CoreConfig {
        max_page_limit: 500,
        ..CoreConfig::default()
    };
    let api = OrderApi::new(InMemoryOrderStore::new(), config).unwrap();
    for n in 1..=101 {
        api.create_order(NewOrder::new(format!("Customer {n}"), dec!(1)));
    }

    let rejected = api.list_orders(QueryParams {
        limit: Some("150".to_string()),
        ..QueryParams::default()
    });
    assert!(!rejected.success);

    let page = api
        .list_orders(QueryParams {
            limit: Some("100".to_string()),
            ..QueryParams::default()
        })
        .data
        .unwrap();
    assert_eq!(page.orders.len(), 100);
    assert_eq!(page.limit, 100);
    assert_eq!(page.total_pages, 2);
}
