use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A unique index rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    Duplicate { constraint: String },

    /// A stock adjustment would drive a product's quantity negative.
    /// The write is rejected; nothing is partially applied.
    #[error("Insufficient stock for product {name}")]
    InsufficientStock { name: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
