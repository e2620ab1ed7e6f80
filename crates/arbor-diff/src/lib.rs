//! Two-way comparison engine for arbor.
//!
//! Given two immutable changesets, the engine walks both trees keyed by
//! [`Gid`](arbor_types::Gid) rather than by path, skips every subtree whose
//! content hash is equal on both sides, and reports each object that was
//! added, deleted, renamed, moved, modified or had its attributes changed.
//!
//! # Pieces
//!
//! - [`TreeNodeCache`] -- memoized tree node loader, one per [`DiffSession`]
//! - [`ObjectTable`] -- gid -> up to two [`Instance`]s (one per [`Side`])
//! - [`closure`] -- depth-ordered work queue driving the walk to completion
//! - [`compute_flags`] -- [`StatusFlags`] for one object
//! - [`PathResolver`] -- memoized historical paths (`@0/dir/foo.txt`)
//! - [`DiffSession::diff`] -- sorted [`ChangeRecord`]s for one pair
//! - [`DiffSession::diff_filtered`] -- the same, restricted to chosen items
//!
//! Everything is single-threaded and synchronous. A session owns its cache;
//! dropping the session drops all state.

pub mod cache;
pub mod closure;
pub mod config;
pub mod error;
pub mod filter;
pub mod flags;
pub mod paths;
pub mod repo;
pub mod session;
pub mod status;
pub mod table;

pub use cache::{CacheStats, TreeNodeCache};
pub use closure::{ClosureStats, WorkQueue};
pub use config::DiffOptions;
pub use error::{DiffError, DiffResult};
pub use filter::{FilterOptions, StatusInput};
pub use flags::{compute_flags, StatusFlags, StatusSummary, Version};
pub use paths::PathResolver;
pub use repo::{GidLocation, RepoView, StoreRepo};
pub use session::DiffSession;
pub use status::{ChangeRecord, Comparison, SideDetail, SymlinkTarget};
pub use table::{Instance, InstanceKind, ObjectRecord, ObjectTable, Side};
