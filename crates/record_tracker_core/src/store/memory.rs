//! Process-local document backend.
//!
//! # Responsibility
//! - Back tests and the `memory` backend without any I/O.
//!
//! # Invariants
//! - Paths are normalized the same way as the persistent backends.
//! - Writing an empty document removes the entry.

use super::error::{StoreError, StoreResult};
use super::{is_empty_document, normalize_path, DocumentStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-process document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose root document is `document`.
    pub fn with_root(document: Value) -> Self {
        let store = Self::new();
        if !is_empty_document(&document) {
            if let Ok(mut documents) = store.documents.lock() {
                documents.insert(String::new(), document);
            }
        }
        store
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.lock().map_or(0, |documents| documents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn read_document(&self, path: &str) -> StoreResult<Option<Value>> {
        let documents = self
            .documents
            .lock()
            .map_err(|_| StoreError::transient("memory store lock poisoned"))?;
        Ok(documents.get(&normalize_path(path)).cloned())
    }

    fn overwrite_document(&self, path: &str, document: &Value) -> StoreResult<()> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| StoreError::transient("memory store lock poisoned"))?;
        let key = normalize_path(path);
        if is_empty_document(document) {
            documents.remove(&key);
        } else {
            documents.insert(key, document.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryDocumentStore;
    use crate::store::DocumentStore;
    use serde_json::json;

    #[test]
    fn overwrite_replaces_and_empty_removes() {
        let store = MemoryDocumentStore::new();
        store.overwrite_document("/", &json!({"a": 1})).unwrap();
        store.overwrite_document("/", &json!({"b": 2})).unwrap();
        assert_eq!(store.read_document("/").unwrap(), Some(json!({"b": 2})));

        store.overwrite_document("/", &json!({})).unwrap();
        assert_eq!(store.read_document("/").unwrap(), None);
        assert!(store.is_empty());
    }
}
