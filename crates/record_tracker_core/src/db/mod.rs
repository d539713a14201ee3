//! SQLite database behind the offline document backend.
//!
//! # Responsibility
//! - Open file or in-memory connections with the documents schema applied.
//! - Check that a caller-supplied connection carries that schema.
//!
//! # Invariants
//! - The schema is one `documents` table keyed by normalized store path.
//!   Each row holds a whole JSON document, mirroring the remote database
//!   where the record tree lives at a single path; the root tree is the
//!   row with the empty path.
//! - Tree shape is checked when a document is decoded, never by SQL.
//! - Schema version is tracked via `PRAGMA user_version`.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Table holding one JSON document per store path.
pub const DOCUMENTS_TABLE: &str = "documents";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The connection was not opened through `open_db*`.
    SchemaNotApplied { db_version: u32, expected: u32 },
    /// Version matches but the documents table was dropped.
    MissingDocumentsTable,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "document database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotApplied {
                db_version,
                expected,
            } => write!(
                f,
                "document store requires schema version {expected}, got {db_version}"
            ),
            Self::MissingDocumentsTable => {
                write!(f, "document store requires table `{DOCUMENTS_TABLE}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Verifies `conn` is at the latest schema and has the documents table.
///
/// # Errors
/// - `SchemaNotApplied` when `user_version` differs from the latest.
/// - `MissingDocumentsTable` when the table is absent.
pub fn ensure_document_schema(conn: &Connection) -> DbResult<()> {
    let db_version = migrations::current_user_version(conn)?;
    let expected = migrations::latest_version();
    if db_version != expected {
        return Err(DbError::SchemaNotApplied {
            db_version,
            expected,
        });
    }

    let has_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [DOCUMENTS_TABLE],
        |row| row.get(0),
    )?;
    if !has_table {
        return Err(DbError::MissingDocumentsTable);
    }
    Ok(())
}
