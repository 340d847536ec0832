use async_trait::async_trait;
use serde_json::Value;

use crate::{Collection, Result};

/// Core trait for durable document storage.
///
/// Documents are JSON objects addressed by `(collection, id)`. A `put`
/// replaces the whole document; there are no partial updates at this level.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a document. Returns `None` if it does not exist.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// Inserts or replaces a document.
    async fn put(&self, collection: Collection, id: &str, value: Value) -> Result<()>;

    /// Stores a new document, failing with [`StoreError::Conflict`] if the id
    /// is already taken.
    ///
    /// [`StoreError::Conflict`]: crate::StoreError::Conflict
    async fn insert(&self, collection: Collection, id: &str, value: Value) -> Result<()>;

    /// Deletes a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;

    /// Returns every document whose top-level `field` equals `value`.
    async fn query(&self, collection: Collection, field: &str, value: &Value)
    -> Result<Vec<Value>>;

    /// Returns every document in a collection.
    async fn list(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Deletes every document in a collection.
    async fn clear(&self, collection: Collection) -> Result<()>;
}
