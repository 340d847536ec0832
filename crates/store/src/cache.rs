//! Write-through cache layer in front of a [`DocumentStore`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{Collection, DocumentStore, Result, StoreError};

/// Default number of entries kept per cached entity type.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// An entity that can be stored as a JSON document.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection this entity is stored in.
    const COLLECTION: Collection;

    /// Returns the document id of this entity.
    fn document_id(&self) -> String;
}

/// Bounded map with least-recently-used eviction.
///
/// Eviction scans for the oldest entry, which is fine for the catalog and
/// per-customer sizes this is used with.
#[derive(Debug)]
struct BoundedMap<T> {
    entries: HashMap<String, (T, u64)>,
    capacity: usize,
    tick: u64,
    /// Bumped on every write or removal; a miss only fills the map if no
    /// write happened while the store was being read.
    epoch: u64,
}

impl<T: Clone> BoundedMap<T> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
            epoch: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn get(&mut self, id: &str) -> Option<T> {
        let tick = self.next_tick();
        self.entries.get_mut(id).map(|(value, last_used)| {
            *last_used = tick;
            value.clone()
        })
    }

    /// Inserts a value, returning true if another entry was evicted.
    fn insert(&mut self, id: String, value: T) -> bool {
        let tick = self.next_tick();
        let mut evicted = false;
        if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, last_used))| *last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
                evicted = true;
            }
        }
        self.entries.insert(id, (value, tick));
        evicted
    }

    fn remove(&mut self, id: &str) {
        self.entries.remove(id);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Read-through, write-through cache for one entity type.
///
/// The store is the source of truth. Reads are served from memory when
/// possible. Writes go to the store first and only reach the cache once the
/// store has accepted them, so the cache never holds a value the store
/// rejected. Clones share the same cache.
pub struct CachedRepository<S, T> {
    store: S,
    entries: Arc<Mutex<BoundedMap<T>>>,
    _phantom: PhantomData<T>,
}

impl<S: Clone, T> Clone for CachedRepository<S, T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            entries: Arc::clone(&self.entries),
            _phantom: PhantomData,
        }
    }
}

impl<S, T> CachedRepository<S, T>
where
    S: DocumentStore,
    T: Document,
{
    /// Creates a repository holding at most `capacity` cached entries.
    pub fn new(store: S, capacity: usize) -> Self {
        Self {
            store,
            entries: Arc::new(Mutex::new(BoundedMap::new(capacity))),
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches an entity, serving it from memory when cached.
    ///
    /// Absence in both cache and store is `Ok(None)`.
    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        let epoch = {
            let mut entries = self.entries.lock().await;
            if let Some(value) = entries.get(id) {
                tracing::trace!(collection = %T::COLLECTION, id, "cache hit");
                metrics::counter!("cache_hits_total", "collection" => T::COLLECTION.as_str())
                    .increment(1);
                return Ok(Some(value));
            }
            entries.epoch
        };

        tracing::trace!(collection = %T::COLLECTION, id, "cache miss");
        metrics::counter!("cache_misses_total", "collection" => T::COLLECTION.as_str())
            .increment(1);

        let Some(raw) = self.store.get(T::COLLECTION, id).await? else {
            return Ok(None);
        };
        let value = decode::<T>(id, raw)?;

        let mut entries = self.entries.lock().await;
        if entries.epoch == epoch {
            self.insert_locked(&mut entries, id.to_string(), value.clone());
        }
        Ok(Some(value))
    }

    /// Writes an entity to the store, then to the cache.
    ///
    /// A store failure is returned and the cache is left untouched.
    pub async fn put(&self, value: &T) -> Result<()> {
        let id = value.document_id();
        let raw = encode(&id, value)?;

        self.store.put(T::COLLECTION, &id, raw).await?;

        let mut entries = self.entries.lock().await;
        entries.epoch += 1;
        self.insert_locked(&mut entries, id, value.clone());
        Ok(())
    }

    /// Stores a new entity, then caches it.
    ///
    /// Fails with [`StoreError::Conflict`] when the id is already stored; the
    /// existing document and the cache are left as they were.
    pub async fn insert(&self, value: &T) -> Result<()> {
        let id = value.document_id();
        let raw = encode(&id, value)?;

        self.store.insert(T::COLLECTION, &id, raw).await?;

        let mut entries = self.entries.lock().await;
        entries.epoch += 1;
        self.insert_locked(&mut entries, id, value.clone());
        Ok(())
    }

    /// Deletes an entity from the store, then drops it from the cache.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(T::COLLECTION, id).await?;

        let mut entries = self.entries.lock().await;
        entries.epoch += 1;
        entries.remove(id);
        Ok(())
    }

    /// Returns every entity in the collection, refreshing the cache.
    pub async fn list(&self) -> Result<Vec<T>> {
        let epoch = self.entries.lock().await.epoch;
        let raw = self.store.list(T::COLLECTION).await?;
        self.decode_and_refresh(epoch, raw).await
    }

    /// Returns entities whose top-level `field` equals `value`, refreshing
    /// the cache.
    pub async fn query(&self, field: &str, value: &Value) -> Result<Vec<T>> {
        let epoch = self.entries.lock().await.epoch;
        let raw = self.store.query(T::COLLECTION, field, value).await?;
        self.decode_and_refresh(epoch, raw).await
    }

    /// Deletes every entity in the collection and empties the cache.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear(T::COLLECTION).await?;

        let mut entries = self.entries.lock().await;
        entries.epoch += 1;
        entries.clear();
        Ok(())
    }

    /// Returns true if the entity is currently held in memory.
    pub async fn is_cached(&self, id: &str) -> bool {
        self.entries.lock().await.contains(id)
    }

    /// Number of entities currently held in memory.
    pub async fn cached_len(&self) -> usize {
        self.entries.lock().await.len()
    }

    async fn decode_and_refresh(&self, epoch: u64, raw: Vec<Value>) -> Result<Vec<T>> {
        let values = raw
            .into_iter()
            .map(|doc| decode::<T>("<list>", doc))
            .collect::<Result<Vec<T>>>()?;

        let mut entries = self.entries.lock().await;
        if entries.epoch == epoch {
            for value in &values {
                self.insert_locked(&mut entries, value.document_id(), value.clone());
            }
        }
        Ok(values)
    }

    fn insert_locked(&self, entries: &mut BoundedMap<T>, id: String, value: T) {
        if entries.insert(id, value) {
            metrics::counter!("cache_evictions_total", "collection" => T::COLLECTION.as_str())
                .increment(1);
        }
    }
}

fn encode<T: Document>(id: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|source| StoreError::Serialization {
        collection: T::COLLECTION,
        id: id.to_string(),
        source,
    })
}

fn decode<T: Document>(id: &str, raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|source| StoreError::Serialization {
        collection: T::COLLECTION,
        id: id.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryDocumentStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: String,
        owner: i64,
        label: String,
    }

    impl Widget {
        fn new(id: &str, owner: i64, label: &str) -> Self {
            Self {
                id: id.to_string(),
                owner,
                label: label.to_string(),
            }
        }
    }

    impl Document for Widget {
        const COLLECTION: Collection = Collection::MenuItems;

        fn document_id(&self) -> String {
            self.id.clone()
        }
    }

    fn repo(store: &InMemoryDocumentStore) -> CachedRepository<InMemoryDocumentStore, Widget> {
        CachedRepository::new(store.clone(), DEFAULT_CACHE_CAPACITY)
    }

    #[tokio::test]
    async fn get_after_put_is_served_from_memory() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);

        widgets.put(&Widget::new("w1", 1, "first")).await.unwrap();
        let found = widgets.get("w1").await.unwrap();

        assert_eq!(found, Some(Widget::new("w1", 1, "first")));
        assert_eq!(store.get_calls(), 0);
    }

    #[tokio::test]
    async fn miss_reads_through_and_populates() {
        let store = InMemoryDocumentStore::new();
        store
            .put(
                Collection::MenuItems,
                "w1",
                serde_json::to_value(Widget::new("w1", 1, "stored")).unwrap(),
            )
            .await
            .unwrap();
        let widgets = repo(&store);

        assert!(!widgets.is_cached("w1").await);
        let first = widgets.get("w1").await.unwrap();
        assert_eq!(first.map(|w| w.label), Some("stored".to_string()));
        assert!(widgets.is_cached("w1").await);

        widgets.get("w1").await.unwrap();
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn absent_everywhere_is_none() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);

        assert!(widgets.get("missing").await.unwrap().is_none());
        assert!(!widgets.is_cached("missing").await);
    }

    #[tokio::test]
    async fn failed_store_write_does_not_touch_cache() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);
        widgets.put(&Widget::new("w1", 1, "old")).await.unwrap();

        store.set_fail_writes(true);
        let result = widgets.put(&Widget::new("w1", 1, "new")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let cached = widgets.get("w1").await.unwrap().unwrap();
        assert_eq!(cached.label, "old");

        let result = widgets.put(&Widget::new("w2", 1, "never")).await;
        assert!(result.is_err());
        assert!(!widgets.is_cached("w2").await);
    }

    #[tokio::test]
    async fn insert_keeps_the_first_document() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);
        widgets.insert(&Widget::new("w1", 1, "first")).await.unwrap();

        let result = widgets.insert(&Widget::new("w1", 2, "second")).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        let cached = widgets.get("w1").await.unwrap().unwrap();
        assert_eq!(cached.label, "first");
        let stored = store.get(Collection::MenuItems, "w1").await.unwrap().unwrap();
        assert_eq!(stored["label"], "first");
    }

    #[tokio::test]
    async fn delete_removes_from_store_and_cache() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);
        widgets.put(&Widget::new("w1", 1, "gone")).await.unwrap();

        widgets.delete("w1").await.unwrap();

        assert!(!widgets.is_cached("w1").await);
        assert!(widgets.get("w1").await.unwrap().is_none());
        assert_eq!(store.document_count(Collection::MenuItems).await, 0);
    }

    #[tokio::test]
    async fn failed_delete_keeps_cache_entry() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);
        widgets.put(&Widget::new("w1", 1, "kept")).await.unwrap();

        store.set_fail_deletes(true);
        assert!(widgets.delete("w1").await.is_err());
        assert!(widgets.is_cached("w1").await);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = InMemoryDocumentStore::new();
        let widgets = CachedRepository::<_, Widget>::new(store.clone(), 2);

        widgets.put(&Widget::new("a", 1, "a")).await.unwrap();
        widgets.put(&Widget::new("b", 1, "b")).await.unwrap();
        // Touch "a" so "b" becomes the oldest.
        widgets.get("a").await.unwrap();
        widgets.put(&Widget::new("c", 1, "c")).await.unwrap();

        assert_eq!(widgets.cached_len().await, 2);
        assert!(widgets.is_cached("a").await);
        assert!(!widgets.is_cached("b").await);
        assert!(widgets.is_cached("c").await);

        // Evicted entries are still readable from the store.
        let b = widgets.get("b").await.unwrap();
        assert_eq!(b.map(|w| w.label), Some("b".to_string()));
    }

    #[tokio::test]
    async fn query_returns_matches_and_refreshes_cache() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);
        widgets.put(&Widget::new("a", 7, "a")).await.unwrap();
        widgets.put(&Widget::new("b", 8, "b")).await.unwrap();
        widgets.put(&Widget::new("c", 7, "c")).await.unwrap();

        let other = repo(&store);
        let mut owned = other.query("owner", &serde_json::json!(7)).await.unwrap();
        owned.sort_by(|x, y| x.id.cmp(&y.id));

        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].id, "a");
        assert!(other.is_cached("a").await);
        assert!(other.is_cached("c").await);
        assert!(!other.is_cached("b").await);
    }

    #[tokio::test]
    async fn clear_empties_store_and_cache() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);
        widgets.put(&Widget::new("a", 1, "a")).await.unwrap();
        widgets.put(&Widget::new("b", 1, "b")).await.unwrap();

        widgets.clear().await.unwrap();

        assert_eq!(widgets.cached_len().await, 0);
        assert!(widgets.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_one_cache() {
        let store = InMemoryDocumentStore::new();
        let widgets = repo(&store);
        let shared = widgets.clone();

        widgets.put(&Widget::new("w1", 1, "shared")).await.unwrap();
        assert!(shared.is_cached("w1").await);
    }
}
