//! Core logic for the record tracker.
//! Aggregation, the whole-document store facade and record mutations live here;
//! presentation layers only render what this crate returns.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod render;
pub mod service;
pub mod store;

pub use aggregate::{compute, month_key, Aggregates, TagCounts};
pub use config::{ConfigError, LoggingConfig, StoreBackend, StoreConfig, TrackerConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::record::{
    month_rank, LeafTag, Month, NewRecord, RecordPath, RecordValidationError,
};
pub use model::tree::{RecordTree, TreeDecodeError};
pub use render::render_summary;
pub use service::record_service::{
    AddRecordRequest, RecordService, ServiceError, ServiceResult, TrackerState,
};
pub use store::http::HttpDocumentStore;
pub use store::memory::MemoryDocumentStore;
pub use store::retry::RetryPolicy;
pub use store::sqlite::SqliteDocumentStore;
pub use store::{DocumentStore, RecordStore, StoreError, StoreErrorKind, ROOT_PATH};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
