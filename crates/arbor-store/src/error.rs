use arbor_types::{ObjectId, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found (e.g. a sparse repository).
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The object data is malformed or of the wrong kind.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// A snapshot description could not be turned into a tree.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// An identifier in the snapshot description was rejected.
    #[error(transparent)]
    InvalidId(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
