//! Merge status for arbor.
//!
//! For a merge changeset `M` with parents `B` and `C` and their lowest
//! common ancestor `A`, [`mstatus`] runs six two-way comparisons
//! (A-B, A-C, B-C, B-M, C-M, A-M) over one shared
//! [`DiffSession`](arbor_diff::DiffSession), folds the records per gid, and
//! explains each change in terms of where it came from: inherited from a
//! parent, made by the merge itself, or reverted by it.
//!
//! A changeset with a single parent falls back to an ordinary two-way
//! comparison against that parent when allowed.

pub mod accumulate;
pub mod config;
pub mod error;
pub mod existence;
pub mod legend;
pub mod mstatus;
pub mod qualify;

pub use accumulate::{Accumulated, Accumulator, Pair};
pub use config::MstatusOptions;
pub use error::{MergeError, MergeResult};
pub use existence::Existence;
pub use legend::{Label, Legend, MergeShape};
pub use mstatus::{mstatus, MergeChangeRecord, MergeChanges, MergeStatus};
