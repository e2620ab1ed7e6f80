//! Content-addressed object storage for arbor.
//!
//! Every blob, tree node and changeset is an immutable object identified by
//! the domain-separated BLAKE3 hash of its bytes. The comparison engine only
//! ever reads from this store; [`SnapshotBuilder`] is the write path used to
//! commit trees.
//!
//! # Object Types
//!
//! - [`Blob`] -- file contents and symlink targets
//! - [`TreeNode`] -- one directory listing, entries keyed by [`Gid`](arbor_types::Gid)
//! - [`Changeset`] -- super-root hash plus parent changesets
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. Equal hashes imply byte-identical, structurally identical objects.
//! 3. Concurrent reads are always safe.
//! 4. A changeset's root is a *super-root*: a tree node holding exactly one
//!    directory entry named [`ROOT_ENTRY_NAME`].

pub mod error;
pub mod memory;
pub mod object;
pub mod snapshot;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{
    Blob, Changeset, EntryType, ObjectKind, StoredObject, TreeEntry, TreeNode, ROOT_ENTRY_NAME,
};
pub use snapshot::{write_changeset, NodeSpec, SnapshotBuilder};
pub use traits::ObjectStore;
