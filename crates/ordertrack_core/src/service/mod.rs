//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into lifecycle use-cases.
//! - Keep transport and presentation layers decoupled from storage details.

pub mod invoice;
pub mod order_service;
