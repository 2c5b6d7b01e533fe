//! Core domain logic for order tracking.
//! This crate is the single source of truth for order business invariants.

pub mod analytics;
pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod query;
pub mod repo;
pub mod service;

pub use analytics::order_stats::{
    analytics_for, compute_analytics, compute_analytics_with_limit, AnalyticsSnapshot,
    CustomerSummary, MonthlyRevenue,
};
pub use api::{ApiResponse, OrderApi};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AttachmentPolicy, ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::notification::{Notification, NotificationId, NotificationKind};
pub use model::order::{InvoiceRef, Order, OrderId, OrderStatus, OrderValidationError};
pub use notify::notification_log::{
    NotificationError, NotificationLog, NotificationResult, NotificationSink,
};
pub use query::order_query::{
    query_orders, query_orders_with_limits, run_query, run_query_with_limits, OrderPage,
    OrderQuery, PageLimits, SortKey, SortOrder,
};
pub use query::params::{QueryParams, QueryValidationError};
pub use repo::order_repo::{InMemoryOrderStore, OrderStore, RepoError, RepoResult, StoreHandle};
pub use repo::sqlite_order_repo::SqliteOrderStore;
pub use service::invoice::{InvoiceFile, InvoiceUploader, UploadError};
pub use service::order_service::{
    NewOrder, OrderIdAllocator, OrderService, OrderServiceError, OrderUpdate,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
