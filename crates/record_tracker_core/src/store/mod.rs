//! Document store boundary and the record store facade.
//!
//! # Responsibility
//! - Define the whole-document read/overwrite contract of a backend.
//! - Decode and encode the record tree at a fixed root path.
//!
//! # Invariants
//! - Writes always carry the entire tree; there are no partial updates.
//! - Overwrites are unconditional: the last writer wins.
//! - Failures are logged and returned as `StoreError`, never swallowed.
//! - A `null` or empty-object document is equivalent to no document.

pub mod error;
pub mod http;
pub mod memory;
pub mod retry;
pub mod sqlite;

use crate::model::tree::RecordTree;
use error::StoreResult;
use log::{error, info};
use serde_json::Value;
use std::time::Instant;

pub use error::{StoreError, StoreErrorKind};

/// Path of the single persisted record document.
pub const ROOT_PATH: &str = "/";

/// Whole-document read/overwrite backend.
pub trait DocumentStore {
    /// Short backend name for diagnostics (`http`, `sqlite`, `memory`).
    fn backend_name(&self) -> &'static str;

    /// Reads the document at `path`. `Ok(None)` when nothing is stored.
    fn read_document(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Replaces the document at `path`. An empty document removes it.
    fn overwrite_document(&self, path: &str, document: &Value) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn read_document(&self, path: &str) -> StoreResult<Option<Value>> {
        (**self).read_document(path)
    }

    fn overwrite_document(&self, path: &str, document: &Value) -> StoreResult<()> {
        (**self).overwrite_document(path, document)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn read_document(&self, path: &str) -> StoreResult<Option<Value>> {
        (**self).read_document(path)
    }

    fn overwrite_document(&self, path: &str, document: &Value) -> StoreResult<()> {
        (**self).overwrite_document(path, document)
    }
}

/// Returns whether a document carries no data (`null` or `{}`).
pub fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Normalizes a path to `/`-separated segments without surrounding slashes.
pub(crate) fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Record tree facade over a document backend.
pub struct RecordStore<D: DocumentStore> {
    backend: D,
    path: String,
}

impl<D: DocumentStore> RecordStore<D> {
    /// Creates a facade over the root document.
    pub fn new(backend: D) -> Self {
        Self {
            backend,
            path: ROOT_PATH.to_string(),
        }
    }

    pub fn backend(&self) -> &D {
        &self.backend
    }

    /// Fetches and decodes the whole tree.
    ///
    /// # Errors
    /// - Backend failures unchanged.
    /// - `InvalidData` when the document is not shaped as a record tree.
    pub fn read(&self) -> StoreResult<Option<RecordTree>> {
        let started_at = Instant::now();
        let result = self
            .backend
            .read_document(&self.path)
            .and_then(|document| match document {
                Some(document) if !is_empty_document(&document) => {
                    RecordTree::from_document(document)
                        .map(Some)
                        .map_err(StoreError::from)
                }
                _ => Ok(None),
            });

        match &result {
            Ok(tree) => info!(
                "event=store_read module=store status=ok backend={} duration_ms={} found={} leaves={}",
                self.backend.backend_name(),
                started_at.elapsed().as_millis(),
                tree.is_some(),
                tree.as_ref().map_or(0, RecordTree::leaf_count)
            ),
            Err(err) => error!(
                "event=store_read module=store status=error backend={} duration_ms={} error_kind={} error={}",
                self.backend.backend_name(),
                started_at.elapsed().as_millis(),
                err.kind.as_str(),
                err.message
            ),
        }
        result
    }

    /// Overwrites the whole document with `tree`.
    pub fn write(&self, tree: &RecordTree) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self
            .backend
            .overwrite_document(&self.path, &tree.to_document());

        match &result {
            Ok(()) => info!(
                "event=store_write module=store status=ok backend={} duration_ms={} leaves={}",
                self.backend.backend_name(),
                started_at.elapsed().as_millis(),
                tree.leaf_count()
            ),
            Err(err) => error!(
                "event=store_write module=store status=error backend={} duration_ms={} error_kind={} error={}",
                self.backend.backend_name(),
                started_at.elapsed().as_millis(),
                err.kind.as_str(),
                err.message
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{is_empty_document, normalize_path};
    use serde_json::json;

    #[test]
    fn empty_documents() {
        assert!(is_empty_document(&json!(null)));
        assert!(is_empty_document(&json!({})));
        assert!(!is_empty_document(&json!({"2024": {}})));
        assert!(!is_empty_document(&json!("x")));
    }

    #[test]
    fn normalize_path_strips_slashes() {
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path("//records/2024/"), "records/2024");
    }
}
