//! Error types for the diff crate.

use arbor_store::{EntryType, StoreError};
use arbor_types::{Gid, ObjectId};

use crate::table::Side;

/// Errors that can occur while comparing two changesets.
///
/// Integrity variants (`DuplicateGid`, `TypeMismatch`, `MissingParent`,
/// `MalformedSuperRoot`, `QueueInconsistency`, `NoInstance`) mean the
/// stored trees are corrupt or the engine's bookkeeping is broken; the
/// comparison is abandoned and no partial result is returned.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A changeset was compared with itself.
    #[error("cannot compare changeset {0} with itself")]
    SameChangeset(ObjectId),

    /// A gid occurs twice within one tree version.
    #[error("gid {gid} occurs more than once in {location}")]
    DuplicateGid { gid: Gid, location: String },

    /// The same gid has different entry types in the two versions.
    #[error("gid {gid} changed type from {orig} to {dest}")]
    TypeMismatch {
        gid: Gid,
        orig: EntryType,
        dest: EntryType,
    },

    /// A child was reached before its parent was populated.
    #[error("parent {parent} of {gid} has no {side} instance")]
    MissingParent { gid: Gid, parent: Gid, side: Side },

    /// The changeset's super-root node does not hold exactly one `@`
    /// directory entry.
    #[error("malformed super-root {root}: {reason}")]
    MalformedSuperRoot { root: ObjectId, reason: String },

    /// The work queue does not hold an entry it must hold.
    #[error("work queue lost track of {gid} at depth {depth}")]
    QueueInconsistency { gid: Gid, depth: u32 },

    /// Flags were requested for an object with no instance on either side.
    #[error("status flags need at least one instance")]
    NoInstance,

    /// A filter input names nothing in either changeset.
    #[error("{0} was not found in either changeset")]
    InputNotFound(String),

    /// Options that cannot be used together.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Store failure, including missing blobs or tree nodes in a sparse
    /// repository.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
