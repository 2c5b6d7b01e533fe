//! Order store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract every service depends on.
//! - Keep backend details (in-memory, SQLite) out of query/lifecycle/analytics.
//!
//! # Invariants
//! - Store writes enforce `Order::validate()` before persistence.
//! - All access from services goes through one `StoreHandle` per store.

pub mod order_repo;
pub mod sqlite_order_repo;
