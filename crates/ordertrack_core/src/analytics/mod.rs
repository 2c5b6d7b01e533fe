//! Derived analytics over order snapshots.

pub mod order_stats;
