//! Domain model for orders and lifecycle notifications.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep serialized field names aligned with the presentation schema (camelCase).
//!
//! # Invariants
//! - Every order is identified by a stable `OrderId`.
//! - Deletion is a hard removal; there are no tombstones.

pub mod notification;
pub mod order;
