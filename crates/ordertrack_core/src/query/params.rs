//! Raw query-parameter validation.
//!
//! # Responsibility
//! - Turn untyped request parameters into a typed `OrderQuery`.
//! - Reject malformed input before it reaches the engine.
//!
//! # Invariants
//! - Date bounds are normalized to UTC instants; no lexical date comparison.
//! - A bare `YYYY-MM-DD` date means midnight UTC of that day.

use crate::model::order::OrderStatus;
use crate::query::order_query::{OrderQuery, SortKey, SortOrder};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Untyped query parameters as received from a transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValidationError {
    InvalidPage(String),
    InvalidLimit { value: String, max: u32 },
    InvalidStatus(String),
    InvalidSortKey(String),
    InvalidSortOrder(String),
    InvalidDate { field: &'static str, value: String },
    InvertedDateRange,
}

impl Display for QueryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPage(value) => write!(f, "page must be a positive integer, got `{value}`"),
            Self::InvalidLimit { value, max } => {
                write!(f, "limit must be an integer within 1..={max}, got `{value}`")
            }
            Self::InvalidStatus(value) => write!(
                f,
                "status must be one of pending|processing|completed|cancelled, got `{value}`"
            ),
            Self::InvalidSortKey(value) => write!(
                f,
                "sortBy must be one of orderId|customerName|orderAmount|orderDate|status, got `{value}`"
            ),
            Self::InvalidSortOrder(value) => {
                write!(f, "sortOrder must be asc or desc, got `{value}`")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "{field} is not a valid date, got `{value}`")
            }
            Self::InvertedDateRange => write!(f, "dateFrom must not be after dateTo"),
        }
    }
}

impl Error for QueryValidationError {}

impl QueryParams {
    /// Validates parameters against the given default and maximum page size.
    pub fn into_query(
        self,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<OrderQuery, QueryValidationError> {
        let page = match non_blank(self.page) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(value) if value >= 1 => value,
                _ => return Err(QueryValidationError::InvalidPage(raw)),
            },
            None => 1,
        };

        let limit = match non_blank(self.limit) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(value) if (1..=max_limit).contains(&value) => value,
                _ => {
                    return Err(QueryValidationError::InvalidLimit {
                        value: raw,
                        max: max_limit,
                    })
                }
            },
            None => default_limit,
        };

        let status = match non_blank(self.status) {
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|_| QueryValidationError::InvalidStatus(raw))?,
            ),
            None => None,
        };

        let sort_by = match non_blank(self.sort_by) {
            Some(raw) => SortKey::parse(&raw).ok_or(QueryValidationError::InvalidSortKey(raw))?,
            None => SortKey::default(),
        };

        let sort_order = match non_blank(self.sort_order) {
            Some(raw) => {
                SortOrder::parse(&raw).ok_or(QueryValidationError::InvalidSortOrder(raw))?
            }
            None => SortOrder::default(),
        };

        let date_from = non_blank(self.date_from)
            .map(|raw| parse_instant("dateFrom", raw))
            .transpose()?;
        let date_to = non_blank(self.date_to)
            .map(|raw| parse_instant("dateTo", raw))
            .transpose()?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(QueryValidationError::InvertedDateRange);
            }
        }

        Ok(OrderQuery {
            page,
            limit,
            status,
            search: non_blank(self.search),
            sort_by,
            sort_order,
            date_from,
            date_to,
        })
    }
}

/// Parses an RFC 3339 timestamp, a naive date-time (UTC) or a bare date
/// (midnight UTC).
pub fn parse_instant(
    field: &'static str,
    raw: String,
) -> Result<DateTime<Utc>, QueryValidationError> {
    let value = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(QueryValidationError::InvalidDate { field, value: raw })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}
