//! Work queue closure: expand directories until nothing is left to scan.
//!
//! Directories are processed in `(min_depth, gid)` order so both trees are
//! walked level by level and converge evenly, instead of one side being
//! expanded depth-first before the other is touched. A directory pair whose
//! content hashes match on both sides is dropped from the queue before it
//! is ever expanded (see [`ObjectTable::set_instance`]).

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, trace};

use arbor_store::{TreeEntry, TreeNode, ROOT_ENTRY_NAME};
use arbor_types::{Gid, ObjectId};

use crate::cache::TreeNodeCache;
use crate::error::{DiffError, DiffResult};
use crate::repo::RepoView;
use crate::table::{ObjectTable, Side};

/// Counters describing how much of the two trees was actually walked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClosureStats {
    /// Directories scheduled for expansion.
    pub enqueued: usize,
    /// Directory pairs dropped because their subtrees are identical.
    pub short_circuited: usize,
    /// Directory listings expanded (one per side).
    pub expanded: usize,
}

/// Directories still waiting to be scanned on one or both sides.
#[derive(Clone, Debug, Default)]
pub struct WorkQueue {
    entries: BTreeSet<(u32, Gid)>,
    stats: ClosureStats,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, depth: u32, gid: &Gid) -> bool {
        self.entries.contains(&(depth, gid.clone()))
    }

    pub fn stats(&self) -> ClosureStats {
        self.stats
    }

    pub(crate) fn push(&mut self, depth: u32, gid: &Gid) {
        if self.entries.insert((depth, gid.clone())) {
            self.stats.enqueued += 1;
        }
    }

    /// Remove the lowest `(depth, gid)` entry.
    pub(crate) fn pop(&mut self) -> Option<(u32, Gid)> {
        self.entries.pop_first()
    }

    /// Drop a pending expansion proven unnecessary. Returns `false` if the
    /// entry was not queued.
    pub(crate) fn cancel(&mut self, depth: u32, gid: &Gid) -> bool {
        let removed = self.entries.remove(&(depth, gid.clone()));
        if removed {
            self.stats.short_circuited += 1;
        }
        removed
    }

    /// Move a queued entry to a new depth key. Returns `false` if the entry
    /// was not queued at `from`.
    pub(crate) fn reschedule(&mut self, from: u32, to: u32, gid: &Gid) -> bool {
        if from == to {
            return self.contains(from, gid);
        }
        if !self.entries.remove(&(from, gid.clone())) {
            return false;
        }
        self.entries.insert((to, gid.clone()));
        true
    }

    fn record_expansion(&mut self) {
        self.stats.expanded += 1;
    }
}

/// Load a changeset's super-root and register its single root entry on
/// `side`.
pub fn populate_super_root<R: RepoView + ?Sized>(
    table: &mut ObjectTable,
    queue: &mut WorkQueue,
    cache: &mut TreeNodeCache,
    repo: &R,
    side: Side,
    super_root: &ObjectId,
) -> DiffResult<()> {
    let node = cache.load(repo, super_root)?;
    let entry = root_entry(&node, super_root)?;
    table.set_instance(queue, side, entry.clone(), None)
}

/// The single `@` directory entry of a super-root node.
pub(crate) fn root_entry<'n>(
    node: &'n TreeNode,
    super_root: &ObjectId,
) -> DiffResult<&'n TreeEntry> {
    let malformed = |reason: String| DiffError::MalformedSuperRoot {
        root: *super_root,
        reason,
    };

    let [entry] = node.entries.as_slice() else {
        return Err(malformed(format!(
            "expected exactly one entry, found {}",
            node.len()
        )));
    };
    if entry.name != ROOT_ENTRY_NAME {
        return Err(malformed(format!(
            "root entry is named {:?}, expected {ROOT_ENTRY_NAME:?}",
            entry.name
        )));
    }
    if !entry.is_directory() {
        return Err(malformed(format!("root entry is a {}", entry.entry_type)));
    }
    Ok(entry)
}

/// Expand queued directories until the queue is empty.
pub fn compute_closure<R: RepoView + ?Sized>(
    table: &mut ObjectTable,
    queue: &mut WorkQueue,
    cache: &mut TreeNodeCache,
    repo: &R,
) -> DiffResult<ClosureStats> {
    while let Some((depth, gid)) = queue.pop() {
        for side in Side::BOTH {
            let Some(hid) = table.begin_scan(&gid, side) else {
                continue;
            };
            let node = cache.load(repo, &hid)?;
            trace!(gid = %gid, depth, %side, children = node.len(), "expanding directory");
            for child in &node.entries {
                table.set_instance(queue, side, child.clone(), Some(gid.clone()))?;
            }
            queue.record_expansion();
        }
    }

    let stats = queue.stats();
    debug!(
        objects = table.len(),
        enqueued = stats.enqueued,
        expanded = stats.expanded,
        short_circuited = stats.short_circuited,
        "closure complete"
    );
    Ok(stats)
}
