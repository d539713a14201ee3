//! Schema steps for the documents database.
//!
//! # Invariants
//! - Steps are listed in increasing `version` order and never edited once
//!   released; a schema change is a new step.
//! - All pending steps and the `user_version` bump commit together, so a
//!   crash never leaves a half-created documents table behind.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// One schema step and the `user_version` it leaves behind.
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "documents",
    sql: include_str!("0001_documents.sql"),
}];

/// Latest schema version known by this binary.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to the latest schema.
///
/// Returns how many steps ran; `0` for an already current database.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is newer than this binary.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let current = current_user_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    let pending = STEPS
        .iter()
        .filter(|step| step.version > current)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=applied version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    Ok(pending.len())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
