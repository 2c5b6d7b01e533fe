//! Lifecycle notification model.
//!
//! Notifications are transient: they live in the bounded notification log and
//! are never persisted with orders.

use crate::model::order::{OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NotificationId = Uuid;

/// Event category carried in the serialized `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCreated,
    OrderUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
    /// Only field callers may change after publication.
    pub read: bool,
}

impl Notification {
    fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        order_id: OrderId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            order_id,
            timestamp,
            read: false,
        }
    }

    /// Event for a freshly created order.
    pub fn order_created(order_id: OrderId, customer_name: &str, at: DateTime<Utc>) -> Self {
        let message = format!("Order {order_id} was placed by {customer_name}");
        Self::new(
            NotificationKind::OrderCreated,
            "New order received",
            message,
            order_id,
            at,
        )
    }

    /// Event for an order whose status actually changed.
    pub fn status_changed(
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> Self {
        let message = format!("Order {order_id} moved from {from} to {to}");
        Self::new(
            NotificationKind::OrderUpdated,
            "Order status updated",
            message,
            order_id,
            at,
        )
    }
}
