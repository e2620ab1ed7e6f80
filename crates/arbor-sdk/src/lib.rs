//! High-level SDK for arbor.
//!
//! [`Arbor`] bundles an object store with the changeset DAG and exposes the
//! comparison engines by changeset name: two-way status, status filtered to
//! selected items, and merge status. A [`Manifest`] describes a whole
//! repository (named changesets with their trees) in TOML or JSON.

pub mod commit;
pub mod error;
pub mod manifest;
pub mod repository;

pub use commit::{ChangesetSummary, CommitRequest};
pub use error::{SdkError, SdkResult};
pub use manifest::{ChangesetSpec, Manifest};
pub use repository::Arbor;

// Re-export key types
pub use arbor_diff::{ChangeRecord, DiffOptions, FilterOptions, SideDetail, StatusInput};
pub use arbor_merge::{MergeChangeRecord, MergeChanges, MergeStatus, MstatusOptions};
pub use arbor_store::{NodeSpec, SnapshotBuilder};
pub use arbor_types::{Gid, ObjectId};
