//! Record use-case services.
//!
//! # Responsibility
//! - Compose the store facade and the aggregator into load/add/delete.
//! - Keep presentation layers decoupled from backend details.

pub mod record_service;
