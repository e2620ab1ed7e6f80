//! Changeset history graph for arbor.
//!
//! Each committed changeset is a [`DagNode`] pointing at its parents. The
//! merge-status engine uses [`ChangesetDag::common_ancestor`] to find the
//! ancestor `A` of a merge's two parents.

pub mod dag;
pub mod error;
pub mod node;

pub use dag::ChangesetDag;
pub use error::{DagError, DagResult};
pub use node::DagNode;
