use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{Collection, DocumentStore, Result, StoreError};

#[derive(Debug, Default)]
struct Instrumentation {
    gets: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

/// In-memory document store.
///
/// Provides the same interface as the PostgreSQL implementation. Call counts
/// are recorded and failures can be injected, so tests can observe how the
/// cache layer and the engines use the store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<Collection, HashMap<String, Value>>>>,
    instrumentation: Arc<Instrumentation>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn document_count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .get(&collection)
            .map_or(0, HashMap::len)
    }

    /// Number of `get` calls served so far.
    pub fn get_calls(&self) -> usize {
        self.instrumentation.gets.load(Ordering::SeqCst)
    }

    /// Number of `put` calls received so far.
    pub fn put_calls(&self) -> usize {
        self.instrumentation.puts.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls received so far.
    pub fn delete_calls(&self) -> usize {
        self.instrumentation.deletes.load(Ordering::SeqCst)
    }

    /// Resets all call counters to zero.
    pub fn reset_counters(&self) {
        self.instrumentation.gets.store(0, Ordering::SeqCst);
        self.instrumentation.puts.store(0, Ordering::SeqCst);
        self.instrumentation.deletes.store(0, Ordering::SeqCst);
    }

    /// Makes every subsequent read (`get`, `query`, `list`) fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.instrumentation.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `put` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.instrumentation
            .fail_writes
            .store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete` and `clear` fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.instrumentation
            .fail_deletes
            .store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str, collection: Collection) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "injected {op} failure on {collection}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        self.instrumentation.gets.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.instrumentation.fail_reads, "read", collection)?;

        let documents = self.documents.read().await;
        Ok(documents
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: Collection, id: &str, value: Value) -> Result<()> {
        self.instrumentation.puts.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.instrumentation.fail_writes, "write", collection)?;

        let mut documents = self.documents.write().await;
        documents
            .entry(collection)
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    async fn insert(&self, collection: Collection, id: &str, value: Value) -> Result<()> {
        self.instrumentation.puts.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.instrumentation.fail_writes, "write", collection)?;

        let mut documents = self.documents.write().await;
        let docs = documents.entry(collection).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }
        docs.insert(id.to_string(), value);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.instrumentation.deletes.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.instrumentation.fail_deletes, "delete", collection)?;

        let mut documents = self.documents.write().await;
        if let Some(docs) = documents.get_mut(&collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        Self::check(&self.instrumentation.fail_reads, "read", collection)?;

        let documents = self.documents.read().await;
        Ok(documents
            .get(&collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        Self::check(&self.instrumentation.fail_reads, "read", collection)?;

        let documents = self.documents.read().await;
        Ok(documents
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, collection: Collection) -> Result<()> {
        Self::check(&self.instrumentation.fail_deletes, "delete", collection)?;

        let mut documents = self.documents.write().await;
        documents.remove(&collection);
        Ok(())
    }
}
