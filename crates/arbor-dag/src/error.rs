//! Error types for the changeset DAG.

use arbor_types::ObjectId;

/// Errors that can occur during DAG operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A referenced changeset is not in the DAG.
    #[error("changeset not found in history: {0}")]
    NodeNotFound(ObjectId),

    /// A parent reference points to a changeset that does not exist.
    #[error("dangling parent reference: {node} references missing parent {parent}")]
    DanglingParent { node: ObjectId, parent: ObjectId },

    /// Attempted to add a changeset that already exists.
    #[error("duplicate changeset: {0}")]
    DuplicateNode(ObjectId),

    /// A node's generation is not greater than one of its parents'.
    #[error("generation of {node} ({generation}) does not exceed parent {parent} ({parent_generation})")]
    GenerationOrder {
        node: ObjectId,
        generation: u64,
        parent: ObjectId,
        parent_generation: u64,
    },
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
