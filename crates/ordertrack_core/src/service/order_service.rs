//! Order lifecycle use-case service.
//!
//! # Responsibility
//! - Create, update, delete and bulk-update orders through the store handle.
//! - Append audit notes for status transitions.
//! - Publish lifecycle notifications to the configured sink.
//!
//! # Invariants
//! - Find-then-mutate runs under one store lock acquisition.
//! - Invalid orders are never persisted.
//! - A status change appends exactly one note and emits exactly one event;
//!   other updates emit nothing.
//! - Deletion emits no notification.
//! - Notification delivery failures never fail the mutation.

use crate::clock::{Clock, SystemClock};
use crate::config::{AttachmentPolicy, CoreConfig, DEFAULT_ORDER_ID_PREFIX};
use crate::model::notification::Notification;
use crate::model::order::{
    status_change_note, validate_amount, validate_customer_name, validate_email, InvoiceRef,
    Order, OrderId, OrderStatus, OrderValidationError,
};
use crate::notify::notification_log::NotificationSink;
use crate::repo::order_repo::{OrderStore, RepoError, StoreHandle};
use crate::service::invoice::{InvoiceFile, InvoiceUploader, UploadError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Service error for order lifecycle use-cases.
#[derive(Debug)]
pub enum OrderServiceError {
    /// Input violates an order invariant.
    Validation(OrderValidationError),
    /// Target order does not exist.
    OrderNotFound(OrderId),
    /// Invoice upload failed under `AttachmentPolicy::Required`.
    Attachment(UploadError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for OrderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::OrderNotFound(id) => write!(f, "order not found: {id}"),
            Self::Attachment(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Attachment(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::OrderNotFound(_) => None,
        }
    }
}

impl From<RepoError> for OrderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::OrderNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<OrderValidationError> for OrderServiceError {
    fn from(value: OrderValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Create payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub order_amount: Decimal,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub invoice: Option<InvoiceRef>,
    /// Historical order date for imports; defaults to the creation instant.
    pub order_date: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn new(customer_name: impl Into<String>, order_amount: Decimal) -> Self {
        Self {
            customer_name: customer_name.into(),
            order_amount,
            ..Self::default()
        }
    }
}

/// Partial update payload; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderUpdate {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub order_amount: Option<Decimal>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderUpdate {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Mints `<prefix>-<sequence>` identifiers.
#[derive(Debug)]
pub struct OrderIdAllocator {
    prefix: String,
    next: AtomicU64,
}

impl OrderIdAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }

    /// Starts the sequence after the largest `<prefix>-<n>` already present.
    pub fn seeded(prefix: impl Into<String>, existing: &[Order]) -> Self {
        let allocator = Self::new(prefix);
        let pattern = format!(r"^{}-(\d+)$", regex::escape(&allocator.prefix));
        if let Ok(matcher) = Regex::new(&pattern) {
            let highest = existing
                .iter()
                .filter_map(|order| matcher.captures(order.order_id.as_str()))
                .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
                .max();
            if let Some(highest) = highest {
                allocator
                    .next
                    .store(highest.saturating_add(1), Ordering::SeqCst);
            }
        }
        allocator
    }

    pub fn allocate(&self) -> OrderId {
        let sequence = self.next.fetch_add(1, Ordering::SeqCst);
        OrderId::new(format!("{}-{sequence}", self.prefix))
    }
}

/// Order lifecycle facade over a shared store.
pub struct OrderService<S: OrderStore> {
    store: StoreHandle<S>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    ids: OrderIdAllocator,
    attachment_policy: AttachmentPolicy,
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a service with default id prefix and attachment policy.
    pub fn new(
        store: StoreHandle<S>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, OrderServiceError> {
        Self::build(store, sink, DEFAULT_ORDER_ID_PREFIX, AttachmentPolicy::default())
    }

    pub fn with_config(
        store: StoreHandle<S>,
        sink: Arc<dyn NotificationSink>,
        config: &CoreConfig,
    ) -> Result<Self, OrderServiceError> {
        Self::build(
            store,
            sink,
            &config.order_id_prefix,
            config.attachment_policy,
        )
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn build(
        store: StoreHandle<S>,
        sink: Arc<dyn NotificationSink>,
        prefix: &str,
        attachment_policy: AttachmentPolicy,
    ) -> Result<Self, OrderServiceError> {
        let existing = store.snapshot()?;
        Ok(Self {
            ids: OrderIdAllocator::seeded(prefix, &existing),
            store,
            sink,
            clock: Arc::new(SystemClock),
            attachment_policy,
        })
    }

    pub fn store(&self) -> &StoreHandle<S> {
        &self.store
    }

    /// Creates one pending order and emits `order_created`.
    pub fn create_order(&self, new_order: NewOrder) -> Result<Order, OrderServiceError> {
        validate_customer_name(&new_order.customer_name)?;
        validate_amount(new_order.order_amount)?;
        let customer_email = normalize_optional(new_order.customer_email);
        if let Some(email) = customer_email.as_deref() {
            validate_email(email)?;
        }

        let now = self.clock.now();
        let order = {
            let mut store = self.store.lock()?;
            let order_id = self.allocate_unique(&*store)?;
            let mut order = Order::new(
                order_id,
                new_order.customer_name,
                new_order.order_amount,
                new_order.order_date.unwrap_or(now),
                now,
            );
            order.customer_email = customer_email;
            order.description = normalize_optional(new_order.description);
            order.payment_method = normalize_optional(new_order.payment_method);
            order.shipping_address = normalize_optional(new_order.shipping_address);
            if let Some(invoice) = new_order.invoice {
                order.attach_invoice(invoice);
            }
            order.validate()?;
            store.upsert(order.clone())?;
            order
        };

        info!(
            "event=order_create module=lifecycle status=ok order_id={} has_invoice={}",
            order.order_id,
            order.invoice().is_some()
        );
        self.publish(Notification::order_created(
            order.order_id.clone(),
            &order.customer_name,
            now,
        ));
        Ok(order)
    }

    /// Uploads an invoice, then creates the order.
    ///
    /// Upload failure follows the configured `AttachmentPolicy`.
    pub fn create_order_with_invoice(
        &self,
        mut new_order: NewOrder,
        file: &InvoiceFile,
        uploader: &dyn InvoiceUploader,
    ) -> Result<Order, OrderServiceError> {
        match uploader.upload(file) {
            Ok(invoice) => new_order.invoice = Some(invoice),
            Err(err) => match self.attachment_policy {
                AttachmentPolicy::BestEffort => {
                    warn!(
                        "event=invoice_upload module=lifecycle status=error policy=best_effort error={}",
                        err.message
                    );
                }
                AttachmentPolicy::Required => {
                    warn!(
                        "event=invoice_upload module=lifecycle status=error policy=required error={}",
                        err.message
                    );
                    return Err(OrderServiceError::Attachment(err));
                }
            },
        }
        self.create_order(new_order)
    }

    /// Gets one order by id.
    pub fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderServiceError> {
        Ok(self.store.get(order_id)?)
    }

    /// Merges `changes` into an existing order.
    pub fn update_order(
        &self,
        order_id: &OrderId,
        changes: OrderUpdate,
    ) -> Result<Order, OrderServiceError> {
        let now = self.clock.now();
        let (order, transition) = {
            let mut store = self.store.lock()?;
            let mut order = store
                .get(order_id)?
                .ok_or_else(|| OrderServiceError::OrderNotFound(order_id.clone()))?;
            let transition = apply_update(&mut order, changes);
            order.touch(now);
            order.validate()?;
            store.upsert(order.clone())?;
            (order, transition)
        };

        match transition {
            Some((from, to)) => {
                info!(
                    "event=order_update module=lifecycle status=ok order_id={} from_status={} to_status={}",
                    order.order_id, from, to
                );
                self.publish(Notification::status_changed(
                    order.order_id.clone(),
                    from,
                    to,
                    now,
                ));
            }
            None => info!(
                "event=order_update module=lifecycle status=ok order_id={} status_changed=false",
                order.order_id
            ),
        }
        Ok(order)
    }

    /// Hard-deletes one order.
    pub fn delete_order(&self, order_id: &OrderId) -> Result<(), OrderServiceError> {
        let removed = self.store.lock()?.remove(order_id)?;
        if !removed {
            return Err(OrderServiceError::OrderNotFound(order_id.clone()));
        }
        info!(
            "event=order_delete module=lifecycle status=ok order_id={}",
            order_id
        );
        Ok(())
    }

    /// Applies the same update to each id in turn.
    ///
    /// Unknown ids are skipped. Any other failure stops the batch; updates
    /// applied before it remain.
    pub fn bulk_update(
        &self,
        order_ids: &[OrderId],
        changes: &OrderUpdate,
    ) -> Result<Vec<Order>, OrderServiceError> {
        let mut updated = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            match self.update_order(order_id, changes.clone()) {
                Ok(order) => updated.push(order),
                Err(OrderServiceError::OrderNotFound(_)) => {
                    debug!(
                        "event=order_bulk_update module=lifecycle status=skipped order_id={}",
                        order_id
                    );
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            "event=order_bulk_update module=lifecycle status=ok requested={} updated={}",
            order_ids.len(),
            updated.len()
        );
        Ok(updated)
    }

    /// Appends a free-text audit note without emitting a notification.
    pub fn add_note(
        &self,
        order_id: &OrderId,
        note: impl Into<String>,
    ) -> Result<Order, OrderServiceError> {
        let note = note.into();
        if note.trim().is_empty() {
            return Err(OrderValidationError::EmptyNote.into());
        }

        let now = self.clock.now();
        let mut store = self.store.lock()?;
        let mut order = store
            .get(order_id)?
            .ok_or_else(|| OrderServiceError::OrderNotFound(order_id.clone()))?;
        order.push_note(note);
        order.touch(now);
        store.upsert(order.clone())?;
        Ok(order)
    }

    fn allocate_unique(&self, store: &S) -> Result<OrderId, OrderServiceError> {
        loop {
            let candidate = self.ids.allocate();
            if store.get(&candidate)?.is_none() {
                return Ok(candidate);
            }
        }
    }

    fn publish(&self, notification: Notification) {
        if let Err(err) = self.sink.publish(notification) {
            warn!(
                "event=notification_publish module=lifecycle status=error error={}",
                err
            );
        }
    }
}

/// Merges changes and records a status transition note when one occurs.
fn apply_update(order: &mut Order, changes: OrderUpdate) -> Option<(OrderStatus, OrderStatus)> {
    if let Some(name) = changes.customer_name {
        order.customer_name = name;
    }
    if let Some(email) = changes.customer_email {
        order.customer_email = normalize_optional(Some(email));
    }
    if let Some(amount) = changes.order_amount {
        order.order_amount = amount;
    }
    if let Some(description) = changes.description {
        order.description = Some(description);
    }
    if let Some(payment_method) = changes.payment_method {
        order.payment_method = Some(payment_method);
    }
    if let Some(shipping_address) = changes.shipping_address {
        order.shipping_address = Some(shipping_address);
    }

    let next = changes.status?;
    let previous = order.status;
    if next == previous {
        return None;
    }
    order.status = next;
    order.push_note(status_change_note(previous, next));
    Some((previous, next))
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{apply_update, OrderIdAllocator, OrderUpdate};
    use crate::model::order::{Order, OrderId, OrderStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order(id: &str) -> Order {
        let now = Utc::now();
        Order::new(OrderId::new(id), "Customer", Decimal::TEN, now, now)
    }

    #[test]
    fn allocator_continues_after_highest_existing_sequence() {
        let existing = vec![order("ORD-7"), order("ORD-12"), order("legacy-99")];
        let allocator = OrderIdAllocator::seeded("ORD", &existing);
        assert_eq!(allocator.allocate().as_str(), "ORD-13");
        assert_eq!(allocator.allocate().as_str(), "ORD-14");
    }

    #[test]
    fn unchanged_status_records_nothing() {
        let mut target = order("ORD-1");
        let transition = apply_update(&mut target, OrderUpdate::status(OrderStatus::Pending));
        assert!(transition.is_none());
        assert_eq!(target.notes.len(), 1);
    }

    #[test]
    fn blank_email_update_clears_email() {
        let mut target = order("ORD-1");
        target.customer_email = Some("a@b.co".to_string());
        let changes = OrderUpdate {
            customer_email: Some(String::new()),
            ..OrderUpdate::default()
        };
        apply_update(&mut target, changes);
        assert!(target.customer_email.is_none());
    }
}
