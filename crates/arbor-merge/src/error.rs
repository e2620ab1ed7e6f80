//! Error types for the merge-status engine.

use arbor_dag::DagError;
use arbor_diff::DiffError;
use arbor_types::{Gid, ObjectId};

/// Errors that can occur while computing merge status.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The changeset is not part of the history graph.
    #[error("changeset {0} is not in the history graph")]
    ChangesetNotInDag(ObjectId),

    /// The changeset has the wrong number of parents for merge status.
    #[error("changeset {merge} has {parents} parent(s) and is not a merge")]
    NotAMerge { merge: ObjectId, parents: usize },

    /// The two parents share no history.
    #[error("parents {left} and {right} have no common ancestor")]
    NoCommonAncestor { left: ObjectId, right: ObjectId },

    /// An accumulated object exists in none of A, B, C, M.
    #[error("object {0} has an empty existence mask")]
    EmptyExistence(Gid),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Dag(#[from] DagError),
}

/// Convenience alias for merge-status results.
pub type MergeResult<T> = Result<T, MergeError>;
