//! In-memory data store.
//!
//! The reference implementation of `DataStore`. Documents live in a
//! HashMap behind a RwLock and disappear with the process.
//!
//! Clones share the same documents, so a test can keep one handle to
//! inspect what the graph wrote through another.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;

use super::DataStore;
use crate::{Error, Result};

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process document storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    documents: RwLock<HashMap<String, String>>,
    /// Number of upcoming saves that fail without writing.
    failing_writes: AtomicUsize,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one document.
    pub fn with_document(key: impl Into<String>, document: impl Into<String>) -> Self {
        let store = Self::new();
        store.inner.documents.write().insert(key.into(), document.into());
        store
    }

    /// Make the next `count` saves fail with a storage error.
    pub fn fail_next_writes(&self, count: usize) {
        self.inner.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Successful saves so far.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Current document under `key`, bypassing the async interface.
    pub fn document(&self, key: &str) -> Option<String> {
        self.inner.documents.read().get(key).cloned()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.inner.documents.read().len())
            .field("writes", &self.write_count())
            .finish()
    }
}

// ============================================================================
// DataStore impl
// ============================================================================

#[async_trait]
impl DataStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.document(key))
    }

    async fn save(&self, key: &str, document: String) -> Result<()> {
        let failing = self.inner.failing_writes.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |n| n.checked_sub(1),
        );
        if failing.is_ok() {
            return Err(Error::Storage(format!("write to {key} rejected")));
        }
        self.inner.documents.write().insert(key.to_string(), document);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
