//! Order filter/sort/pagination engine.
//!
//! # Responsibility
//! - Apply status, search and date-range predicates to an order snapshot.
//! - Sort by one typed key and slice a page, reporting the filtered total.
//!
//! # Invariants
//! - Sorting is stable; ties keep snapshot order in both directions.
//! - `total` counts filtered orders before pagination.
//! - An empty result is a successful answer.

use crate::config::{CoreConfig, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::model::order::{Order, OrderStatus};
use crate::repo::order_repo::{OrderStore, RepoResult, StoreHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Field an order page is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    OrderId,
    CustomerName,
    OrderAmount,
    #[default]
    OrderDate,
    Status,
}

impl SortKey {
    /// Compares two orders by this key in ascending order.
    pub fn compare(self, a: &Order, b: &Order) -> Ordering {
        match self {
            Self::OrderId => a.order_id.as_str().cmp(b.order_id.as_str()),
            Self::CustomerName => a.customer_name.cmp(&b.customer_name),
            Self::OrderAmount => a.order_amount.cmp(&b.order_amount),
            Self::OrderDate => a.order_date.cmp(&b.order_date),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderId => "orderId",
            Self::CustomerName => "customerName",
            Self::OrderAmount => "orderAmount",
            Self::OrderDate => "orderDate",
            Self::Status => "status",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "orderId" => Some(Self::OrderId),
            "customerName" => Some(Self::CustomerName),
            "orderAmount" => Some(Self::OrderAmount),
            "orderDate" => Some(Self::OrderDate),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Query descriptor for one read of the order list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    /// 1-based page number; `0` is treated as `1`.
    pub page: u32,
    /// Page size; `0` falls back to the default, values above the max clamp.
    pub limit: u32,
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring over id, customer name and email.
    pub search: Option<String>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    /// Inclusive lower bound on `order_date`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `order_date`.
    pub date_to: Option<DateTime<Utc>>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            status: None,
            search: None,
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
            date_from: None,
            date_to: None,
        }
    }
}

impl OrderQuery {
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn effective_limit(&self, limits: PageLimits) -> u32 {
        normalize_page_limit(self.limit, limits.default_limit, limits.max_limit)
    }

    /// Returns whether `order` passes every filter predicate.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }

        if let Some(term) = self.search.as_deref().filter(|term| !term.is_empty()) {
            if !matches_search(order, &term.to_lowercase()) {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if order.order_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if order.order_date > to {
                return false;
            }
        }

        true
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Filtered count before pagination.
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: usize,
}

/// Default and maximum page sizes applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// Clamps configured values into `1..=MAX_PAGE_LIMIT`, default within max.
impl From<&CoreConfig> for PageLimits {
    fn from(config: &CoreConfig) -> Self {
        let max_limit = config.max_page_limit.clamp(1, MAX_PAGE_LIMIT);
        Self {
            default_limit: config.default_page_limit.clamp(1, max_limit),
            max_limit,
        }
    }
}

/// Normalizes a requested page size.
pub fn normalize_page_limit(limit: u32, default_limit: u32, max_limit: u32) -> u32 {
    match limit {
        0 => default_limit,
        value if value > max_limit => max_limit,
        value => value,
    }
}

/// Runs a query over an owned snapshot with the built-in page limits.
pub fn run_query(orders: Vec<Order>, query: &OrderQuery) -> OrderPage {
    run_query_with_limits(orders, query, PageLimits::default())
}

pub fn run_query_with_limits(
    orders: Vec<Order>,
    query: &OrderQuery,
    limits: PageLimits,
) -> OrderPage {
    let mut filtered: Vec<Order> = orders
        .into_iter()
        .filter(|order| query.matches(order))
        .collect();

    let sort_by = query.sort_by;
    let sort_order = query.sort_order;
    filtered.sort_by(|a, b| sort_order.apply(sort_by.compare(a, b)));

    let total = filtered.len();
    let page = query.effective_page();
    let limit = query.effective_limit(limits);
    let start = (page as usize - 1).saturating_mul(limit as usize);
    let orders = filtered
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();

    OrderPage {
        orders,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit as usize),
    }
}

/// Snapshots the store behind `handle` and runs `query` over it.
pub fn query_orders<S: OrderStore>(
    handle: &StoreHandle<S>,
    query: &OrderQuery,
) -> RepoResult<OrderPage> {
    query_orders_with_limits(handle, query, PageLimits::default())
}

pub fn query_orders_with_limits<S: OrderStore>(
    handle: &StoreHandle<S>,
    query: &OrderQuery,
    limits: PageLimits,
) -> RepoResult<OrderPage> {
    let snapshot = handle.snapshot()?;
    Ok(run_query_with_limits(snapshot, query, limits))
}

fn matches_search(order: &Order, needle: &str) -> bool {
    order.order_id.as_str().to_lowercase().contains(needle)
        || order.customer_name.to_lowercase().contains(needle)
        || order
            .customer_email
            .as_deref()
            .is_some_and(|email| email.to_lowercase().contains(needle))
}
