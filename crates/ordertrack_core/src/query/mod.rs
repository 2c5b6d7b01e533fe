//! Order query entry points.
//!
//! # Responsibility
//! - Validate raw query parameters into typed descriptors.
//! - Filter, sort and paginate order snapshots.

pub mod order_query;
pub mod params;
