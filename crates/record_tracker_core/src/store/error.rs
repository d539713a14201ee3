//! Typed failures shared by every document backend.
//!
//! # Responsibility
//! - Classify backend failures into a small set of `StoreErrorKind`s.
//! - Convert SQLite and decode errors into that classification.
//!
//! # Invariants
//! - Only `Transient` is retryable.
//! - `Display` prefixes the message with the stable kind code.

use crate::db::DbError;
use crate::model::tree::TreeDecodeError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure class of a document store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Network, timeout, throttling or busy backend. Safe to retry.
    Transient,
    /// Addressed location does not exist on the backend.
    NotFound,
    /// Credentials missing, expired or insufficient.
    Permission,
    /// Backend refused the request for any other reason.
    Rejected,
    /// Stored document does not decode as a record tree.
    InvalidData,
}

impl StoreErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::NotFound => "not_found",
            Self::Permission => "permission_denied",
            Self::Rejected => "rejected",
            Self::InvalidData => "invalid_data",
        }
    }

    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transient, message)
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::InvalidData, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl Error for StoreError {}

impl From<TreeDecodeError> for StoreError {
    fn from(value: TreeDecodeError) -> Self {
        Self::invalid_data(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::invalid_data(format!("document is not valid JSON: {value}"))
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        let kind = match &value {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)) => match failure.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => StoreErrorKind::Transient,
                ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::CannotOpen
                | ErrorCode::AuthorizationForStatementDenied => StoreErrorKind::Permission,
                _ => StoreErrorKind::Rejected,
            },
            DbError::Sqlite(_)
            | DbError::UnsupportedSchemaVersion { .. }
            | DbError::SchemaNotApplied { .. }
            | DbError::MissingDocumentsTable => StoreErrorKind::Rejected,
        };
        Self::new(kind, value.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        DbError::Sqlite(value).into()
    }
}
