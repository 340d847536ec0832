use thiserror::Error;

use crate::Collection;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A document could not be encoded or decoded.
    #[error("Serialization error in {collection}/{id}: {source}")]
    Serialization {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// An insert found a document already stored under the same id.
    #[error("Document {collection}/{id} already exists")]
    Conflict { collection: Collection, id: String },

    /// The backend refused or failed the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
