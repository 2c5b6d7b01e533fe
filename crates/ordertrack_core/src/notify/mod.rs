//! Lifecycle notification delivery.
//!
//! # Responsibility
//! - Define the sink contract the order service publishes to.
//! - Provide the bounded in-process log polled by presentation layers.

pub mod notification_log;
