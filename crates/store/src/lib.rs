//! Durable document storage for the chat commerce engine.
//!
//! A [`DocumentStore`] persists JSON documents grouped by [`Collection`].
//! [`CachedRepository`] puts a bounded, write-through in-memory map in front
//! of a store for one entity type.

pub mod cache;
pub mod collection;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CachedRepository, DEFAULT_CACHE_CAPACITY, Document};
pub use collection::Collection;
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use store::DocumentStore;
