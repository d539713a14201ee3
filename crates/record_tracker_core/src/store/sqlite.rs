//! SQLite-backed document store.
//!
//! # Responsibility
//! - Keep whole JSON documents in the `documents` table, keyed by path.
//!
//! # Invariants
//! - The borrowed connection must be migrated to the latest schema.
//! - One row per path; overwrite replaces the row body.

use super::error::{StoreError, StoreResult};
use super::{is_empty_document, normalize_path, DocumentStore};
use crate::db::ensure_document_schema;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Document store over a caller-owned SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `Rejected` when the schema version is not the latest one.
    /// - `Rejected` when the `documents` table is missing.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_document_schema(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn read_document(&self, path: &str) -> StoreResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE path = ?1;",
                params![normalize_path(path)],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| serde_json::from_str(&body).map_err(StoreError::from))
            .transpose()
    }

    fn overwrite_document(&self, path: &str, document: &Value) -> StoreResult<()> {
        let key = normalize_path(path);
        if is_empty_document(document) {
            self.conn
                .execute("DELETE FROM documents WHERE path = ?1;", params![key])?;
            return Ok(());
        }

        let body = serde_json::to_string(document)?;
        self.conn.execute(
            "INSERT INTO documents (path, body, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(path) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at;",
            params![key, body, now_epoch_ms()],
        )?;
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
