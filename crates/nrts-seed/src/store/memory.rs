//! In-memory document store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::DocumentStore;
use crate::error::{Error, Result};
use crate::record::{BootstrapRecord, RecordId};

const STORE_NAME: &str = "memory";

type Collections = HashMap<String, BTreeMap<RecordId, BootstrapRecord>>;

/// A document store kept entirely in process memory.
///
/// Identifiers are unique per collection. The store can be taken offline
/// with [`MemoryStore::set_available`] to simulate an unreachable server.
#[derive(Debug)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    available: AtomicBool,
    inserts: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, reachable store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            inserts: AtomicUsize::new(0),
        }
    }

    /// Mark the store reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful inserts performed against this store.
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Total number of documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] while the store is offline.
    pub fn len(&self, collection: &str) -> Result<usize> {
        let guard = self.lock()?;
        Ok(guard.get(collection).map_or(0, BTreeMap::len))
    }

    /// Check if a collection holds no documents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] while the store is offline.
    pub fn is_empty(&self, collection: &str) -> Result<bool> {
        Ok(self.len(collection)? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::store_unavailable(STORE_NAME, "store is offline"));
        }
        self.collections
            .lock()
            .map_err(|_| Error::store_unavailable(STORE_NAME, "store lock poisoned"))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        STORE_NAME
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<BootstrapRecord>> {
        let guard = self.lock()?;
        Ok(guard
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn insert(&self, collection: &str, record: &BootstrapRecord) -> Result<()> {
        let mut guard = self.lock()?;
        let documents = guard.entry(collection.to_string()).or_default();
        if documents.contains_key(&record.id) {
            return Err(Error::duplicate_key(collection, record.id.as_str()));
        }
        documents.insert(record.id.clone(), record.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        debug!("Inserted document {} into {}", record.id, collection);
        Ok(())
    }

    async fn count_by_id(&self, collection: &str, id: &RecordId) -> Result<u64> {
        let guard = self.lock()?;
        let present = guard
            .get(collection)
            .is_some_and(|documents| documents.contains_key(id));
        Ok(u64::from(present))
    }
}
