//! Use-case API for transport and presentation layers.
//!
//! # Responsibility
//! - Wire store, lifecycle service, notification log and config together.
//! - Return structured success/failure envelopes with readable messages.
//!
//! # Invariants
//! - Functions here never panic and never leak internal fault details;
//!   storage failures are logged and reported with a generic message.
//! - "No matches" is a successful, empty response.

use crate::analytics::order_stats::{analytics_for, AnalyticsSnapshot};
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::model::notification::Notification;
use crate::model::order::{Order, OrderId};
use crate::notify::notification_log::NotificationLog;
use crate::query::order_query::{query_orders_with_limits, OrderPage, PageLimits};
use crate::query::params::QueryParams;
use crate::repo::order_repo::{OrderStore, StoreHandle};
use crate::service::invoice::{InvoiceFile, InvoiceUploader};
use crate::service::order_service::{NewOrder, OrderService, OrderServiceError, OrderUpdate};
use log::error;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use uuid::Uuid;

const INTERNAL_ERROR_MESSAGE: &str = "Order storage is temporarily unavailable.";

/// Response envelope returned by every API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
        }
    }
}

/// Facade over one order store.
pub struct OrderApi<S: OrderStore> {
    orders: OrderService<S>,
    notifications: Arc<NotificationLog>,
    config: CoreConfig,
}

impl<S: OrderStore> OrderApi<S> {
    pub fn new(store: S, config: CoreConfig) -> Result<Self, OrderServiceError> {
        let notifications = Arc::new(NotificationLog::with_capacity(
            config.notification_capacity,
        ));
        let orders = OrderService::with_config(
            StoreHandle::new(store),
            notifications.clone(),
            &config,
        )?;
        Ok(Self {
            orders,
            notifications,
            config,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.orders = self.orders.with_clock(clock);
        self
    }

    pub fn orders(&self) -> &OrderService<S> {
        &self.orders
    }

    pub fn notification_log(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn create_order(&self, new_order: NewOrder) -> ApiResponse<Order> {
        match self.orders.create_order(new_order) {
            Ok(order) => ApiResponse::success(order, "Order created successfully"),
            Err(err) => service_failure("create_order", &err),
        }
    }

    pub fn create_order_with_invoice(
        &self,
        new_order: NewOrder,
        file: &InvoiceFile,
        uploader: &dyn InvoiceUploader,
    ) -> ApiResponse<Order> {
        match self
            .orders
            .create_order_with_invoice(new_order, file, uploader)
        {
            Ok(order) => ApiResponse::success(order, "Order created successfully"),
            Err(err) => service_failure("create_order", &err),
        }
    }

    pub fn get_order(&self, order_id: &str) -> ApiResponse<Order> {
        let order_id = OrderId::new(order_id);
        match self.orders.get_order(&order_id) {
            Ok(Some(order)) => ApiResponse::success(order, "Order found"),
            Ok(None) => ApiResponse::failure(format!("order not found: {order_id}")),
            Err(err) => service_failure("get_order", &err),
        }
    }

    pub fn update_order(&self, order_id: &str, changes: OrderUpdate) -> ApiResponse<Order> {
        match self.orders.update_order(&OrderId::new(order_id), changes) {
            Ok(order) => ApiResponse::success(order, "Order updated successfully"),
            Err(err) => service_failure("update_order", &err),
        }
    }

    pub fn delete_order(&self, order_id: &str) -> ApiResponse<OrderId> {
        let order_id = OrderId::new(order_id);
        match self.orders.delete_order(&order_id) {
            Ok(()) => ApiResponse::success(order_id, "Order deleted successfully"),
            Err(err) => service_failure("delete_order", &err),
        }
    }

    pub fn bulk_update(
        &self,
        order_ids: &[String],
        changes: OrderUpdate,
    ) -> ApiResponse<Vec<Order>> {
        let ids: Vec<OrderId> = order_ids.iter().map(|id| OrderId::new(id.as_str())).collect();
        match self.orders.bulk_update(&ids, &changes) {
            Ok(updated) => {
                let message = format!("Updated {} of {} orders", updated.len(), ids.len());
                ApiResponse::success(updated, message)
            }
            Err(err) => service_failure("bulk_update", &err),
        }
    }

    /// Validates raw parameters, then runs the query.
    ///
    /// Validation and paging use the same configured limits.
    pub fn list_orders(&self, params: QueryParams) -> ApiResponse<OrderPage> {
        let limits = PageLimits::from(&self.config);
        let query = match params.into_query(limits.default_limit, limits.max_limit) {
            Ok(query) => query,
            Err(err) => return ApiResponse::failure(err.to_string()),
        };
        match query_orders_with_limits(self.orders.store(), &query, limits) {
            Ok(page) => {
                let message = format!("Found {} orders", page.total);
                ApiResponse::success(page, message)
            }
            Err(err) => internal_failure("list_orders", &err),
        }
    }

    pub fn analytics(&self) -> ApiResponse<AnalyticsSnapshot> {
        match analytics_for(self.orders.store(), self.config.top_customer_limit) {
            Ok(snapshot) => ApiResponse::success(snapshot, "Analytics computed"),
            Err(err) => internal_failure("analytics", &err),
        }
    }

    pub fn notifications(&self, limit: usize) -> ApiResponse<Vec<Notification>> {
        match self.notifications.recent(limit) {
            Ok(entries) => {
                let message = format!("{} notifications", entries.len());
                ApiResponse::success(entries, message)
            }
            Err(err) => internal_failure("notifications", &err),
        }
    }

    pub fn mark_notification_read(&self, notification_id: &str) -> ApiResponse<Notification> {
        let Ok(id) = Uuid::parse_str(notification_id.trim()) else {
            return ApiResponse::failure(format!(
                "invalid notification id: `{notification_id}`"
            ));
        };
        match self.notifications.mark_read(id) {
            Ok(entry) => ApiResponse::success(entry, "Notification marked as read"),
            Err(err) => ApiResponse::failure(err.to_string()),
        }
    }
}

fn service_failure<T>(operation: &'static str, err: &OrderServiceError) -> ApiResponse<T> {
    match err {
        OrderServiceError::Repo(inner) => internal_failure(operation, inner),
        other => ApiResponse::failure(other.to_string()),
    }
}

fn internal_failure<T>(operation: &'static str, err: &dyn Display) -> ApiResponse<T> {
    error!("event=api_call module=api status=error operation={operation} error={err}");
    ApiResponse::failure(INTERNAL_ERROR_MESSAGE)
}
