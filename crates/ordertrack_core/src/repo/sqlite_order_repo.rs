//! SQLite-backed order store.
//!
//! # Responsibility
//! - Persist orders in the `orders` table created by core migrations.
//! - Preserve the newest-first iteration contract across restarts.
//!
//! # Invariants
//! - `position` is assigned once on first insert and never rewritten.
//! - Amounts are stored as decimal text; timestamps as RFC 3339 with nanoseconds.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{open_db, open_db_in_memory};
use crate::model::order::{Order, OrderId, OrderStatus};
use crate::repo::order_repo::{OrderStore, RepoError, RepoResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

const ORDER_SELECT_SQL: &str = "SELECT
    order_id,
    customer_name,
    customer_email,
    order_amount,
    order_date,
    description,
    payment_method,
    shipping_address,
    status,
    invoice_file_url,
    invoice_file_name,
    notes,
    created_at,
    updated_at
FROM orders";

const REQUIRED_COLUMNS: [&str; 15] = [
    "order_id",
    "position",
    "customer_name",
    "customer_email",
    "order_amount",
    "order_date",
    "description",
    "payment_method",
    "shipping_address",
    "status",
    "invoice_file_url",
    "invoice_file_name",
    "notes",
    "created_at",
    "updated_at",
];

/// Order store over one owned, migrated SQLite connection.
pub struct SqliteOrderStore {
    conn: Connection,
}

impl SqliteOrderStore {
    /// Wraps a migrated connection after checking the `orders` schema.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Opens a database file, applying migrations as needed.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Releases the underlying connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl OrderStore for SqliteOrderStore {
    fn get(&self, id: &OrderId) -> RepoResult<Option<Order>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ORDER_SELECT_SQL} WHERE order_id = ?1;"))?;
        let row = stmt
            .query_row([id.as_str()], |row| Ok(parse_order_row(row)))
            .optional()?;
        row.transpose()
    }

    fn upsert(&mut self, order: Order) -> RepoResult<()> {
        order.validate()?;
        let notes = serde_json::to_string(&order.notes)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode notes: {err}")))?;

        self.conn.execute(
            "INSERT INTO orders (
                order_id,
                position,
                customer_name,
                customer_email,
                order_amount,
                order_date,
                description,
                payment_method,
                shipping_address,
                status,
                invoice_file_url,
                invoice_file_name,
                notes,
                created_at,
                updated_at
            ) VALUES (
                ?1,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM orders),
                ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14
            )
            ON CONFLICT(order_id) DO UPDATE SET
                customer_name = excluded.customer_name,
                customer_email = excluded.customer_email,
                order_amount = excluded.order_amount,
                order_date = excluded.order_date,
                description = excluded.description,
                payment_method = excluded.payment_method,
                shipping_address = excluded.shipping_address,
                status = excluded.status,
                invoice_file_url = excluded.invoice_file_url,
                invoice_file_name = excluded.invoice_file_name,
                notes = excluded.notes,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at;",
            params![
                order.order_id.as_str(),
                order.customer_name.as_str(),
                order.customer_email.as_deref(),
                order.order_amount.to_string(),
                timestamp_to_db(order.order_date),
                order.description.as_deref(),
                order.payment_method.as_deref(),
                order.shipping_address.as_deref(),
                order.status.as_str(),
                order.invoice_file_url.as_deref(),
                order.invoice_file_name.as_deref(),
                notes,
                timestamp_to_db(order.created_at),
                timestamp_to_db(order.updated_at),
            ],
        )?;

        Ok(())
    }

    fn remove(&mut self, id: &OrderId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM orders WHERE order_id = ?1;", [id.as_str()])?;
        Ok(changed > 0)
    }

    fn list(&self) -> RepoResult<Vec<Order>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ORDER_SELECT_SQL} ORDER BY position DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(parse_order_row(row)?);
        }
        Ok(orders)
    }

    fn len(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM orders;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative order count `{count}`")))
    }
}

fn parse_order_row(row: &Row<'_>) -> RepoResult<Order> {
    let amount_text: String = row.get("order_amount")?;
    let order_amount = Decimal::from_str(&amount_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid amount `{amount_text}` in orders.order_amount"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = OrderStatus::from_str(&status_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in orders.status"))
    })?;

    let notes_text: String = row.get("notes")?;
    let notes: Vec<String> = serde_json::from_str(&notes_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid notes json in orders.notes: {err}"))
    })?;

    let order = Order {
        order_id: OrderId::new(row.get::<_, String>("order_id")?),
        customer_name: row.get("customer_name")?,
        customer_email: row.get("customer_email")?,
        order_amount,
        order_date: parse_timestamp(row, "order_date")?,
        description: row.get("description")?,
        payment_method: row.get("payment_method")?,
        shipping_address: row.get("shipping_address")?,
        status,
        invoice_file_url: row.get("invoice_file_url")?,
        invoice_file_name: row.get("invoice_file_name")?,
        notes,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    };
    order.validate()?;
    Ok(order)
}

fn timestamp_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(row: &Row<'_>, column: &'static str) -> RepoResult<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| {
            RepoError::InvalidData(format!("invalid timestamp `{text}` in orders.{column}"))
        })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'orders'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::InvalidData(
            "missing required table `orders`; run migrations first".to_string(),
        ));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(orders);")?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        present.push(row.get::<_, String>(1)?);
    }
    for column in REQUIRED_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::InvalidData(format!(
                "missing required column `orders.{column}`"
            )));
        }
    }
    Ok(())
}
