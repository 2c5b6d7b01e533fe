//! Order domain model.
//!
//! # Responsibility
//! - Define the canonical order record shared by query, lifecycle and analytics.
//! - Own field-level business validation for orders.
//!
//! # Invariants
//! - `order_id` is stable and never reused for another order.
//! - `order_amount` is strictly positive.
//! - `notes` is append-only; insertion order is the audit order.
//! - `updated_at >= created_at`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Seed note attached to every newly created order.
pub const ORDER_RECEIVED_NOTE: &str = "Order received and awaiting confirmation";

/// Opaque order identifier (`ORD-<sequence>` for ids minted by this crate).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Order lifecycle state.
///
/// Transitions are free-form between the four values; every actual change is
/// recorded as a note by the lifecycle service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received, not yet confirmed.
    Pending,
    /// Confirmed and being worked on.
    Processing,
    /// Fulfilled; the only status counted as revenue.
    Completed,
    /// Abandoned by customer or operator.
    Cancelled,
}

impl OrderStatus {
    /// All statuses in declaration order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Reference to an invoice file stored outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRef {
    pub file_name: String,
    pub file_url: String,
}

/// Field-level validation failures for orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    EmptyOrderId,
    EmptyCustomerName,
    InvalidEmail(String),
    NonPositiveAmount(Decimal),
    UnknownStatus(String),
    UpdatedBeforeCreated,
    EmptyNote,
}

impl Display for OrderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOrderId => write!(f, "order id must not be empty"),
            Self::EmptyCustomerName => write!(f, "customer name is required"),
            Self::InvalidEmail(value) => write!(f, "invalid customer email: `{value}`"),
            Self::NonPositiveAmount(value) => {
                write!(f, "order amount must be greater than zero, got {value}")
            }
            Self::UnknownStatus(value) => write!(
                f,
                "unknown order status `{value}`; expected pending|processing|completed|cancelled"
            ),
            Self::UpdatedBeforeCreated => write!(f, "updated_at must not precede created_at"),
            Self::EmptyNote => write!(f, "note text must not be blank"),
        }
    }
}

impl Error for OrderValidationError {}

/// Canonical order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub order_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub status: OrderStatus,
    pub invoice_file_url: Option<String>,
    pub invoice_file_name: Option<String>,
    /// Audit trail, oldest first.
    pub notes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order with the seed note and equal create/update stamps.
    ///
    /// `order_date` is usually `now`; import paths may pass a historical date.
    pub fn new(
        order_id: OrderId,
        customer_name: impl Into<String>,
        order_amount: Decimal,
        order_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer_name: customer_name.into(),
            customer_email: None,
            order_amount,
            order_date,
            description: None,
            payment_method: None,
            shipping_address: None,
            status: OrderStatus::Pending,
            invoice_file_url: None,
            invoice_file_name: None,
            notes: vec![ORDER_RECEIVED_NOTE.to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks business invariants that must hold before persistence.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.order_id.as_str().trim().is_empty() {
            return Err(OrderValidationError::EmptyOrderId);
        }
        validate_customer_name(&self.customer_name)?;
        if let Some(email) = self.customer_email.as_deref() {
            validate_email(email)?;
        }
        validate_amount(self.order_amount)?;
        if self.updated_at < self.created_at {
            return Err(OrderValidationError::UpdatedBeforeCreated);
        }
        Ok(())
    }

    /// Attaches an externally stored invoice reference.
    pub fn attach_invoice(&mut self, invoice: InvoiceRef) {
        self.invoice_file_name = Some(invoice.file_name);
        self.invoice_file_url = Some(invoice.file_url);
    }

    /// Returns the attached invoice reference, when both parts are present.
    pub fn invoice(&self) -> Option<InvoiceRef> {
        match (&self.invoice_file_name, &self.invoice_file_url) {
            (Some(file_name), Some(file_url)) => Some(InvoiceRef {
                file_name: file_name.clone(),
                file_url: file_url.clone(),
            }),
            _ => None,
        }
    }

    /// Appends one audit note.
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Moves `updated_at` forward, never behind `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

/// Audit note recorded for a status transition.
pub fn status_change_note(from: OrderStatus, to: OrderStatus) -> String {
    format!("Status changed from {from} to {to}")
}

pub fn validate_customer_name(name: &str) -> Result<(), OrderValidationError> {
    if name.trim().is_empty() {
        return Err(OrderValidationError::EmptyCustomerName);
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), OrderValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(OrderValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

pub fn validate_amount(amount: Decimal) -> Result<(), OrderValidationError> {
    if amount <= Decimal::ZERO {
        return Err(OrderValidationError::NonPositiveAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{status_change_note, Order, OrderId, OrderStatus, OrderValidationError};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn sample() -> Order {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Order::new(OrderId::new("ORD-1"), "Ada", Decimal::new(1999, 2), now, now)
    }

    #[test]
    fn new_order_starts_pending_with_seed_note() {
        let order = sample();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.notes.len(), 1);
        assert_eq!(order.created_at, order.updated_at);
        assert!(order.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let mut order = sample();
        order.order_amount = Decimal::ZERO;
        assert!(matches!(
            order.validate(),
            Err(OrderValidationError::NonPositiveAmount(_))
        ));

        let mut order = sample();
        order.customer_name = "   ".to_string();
        assert_eq!(order.validate(), Err(OrderValidationError::EmptyCustomerName));

        let mut order = sample();
        order.customer_email = Some("not-an-email".to_string());
        assert!(matches!(
            order.validate(),
            Err(OrderValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn touch_never_moves_before_created_at() {
        let mut order = sample();
        let earlier = order.created_at - chrono::Duration::hours(1);
        order.touch(earlier);
        assert_eq!(order.updated_at, order.created_at);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(
            status_change_note(OrderStatus::Pending, OrderStatus::Completed),
            "Status changed from pending to completed"
        );
    }
}
