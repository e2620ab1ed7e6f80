//! Gid-keyed object table.
//!
//! Every object met while walking either tree gets one [`ObjectRecord`],
//! holding at most one [`Instance`] per [`Side`]. Records live for the whole
//! comparison; cross references (parent links) are plain gids, never
//! pointers into the table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use arbor_store::{EntryType, TreeEntry};
use arbor_types::{Gid, ObjectId};

use crate::closure::WorkQueue;
use crate::error::{DiffError, DiffResult};
use crate::flags::Version;

/// One of the two changesets being compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Orig,
    Dest,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Orig, Side::Dest];

    pub fn index(self) -> usize {
        match self {
            Side::Orig => 0,
            Side::Dest => 1,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Orig => Side::Dest,
            Side::Dest => Side::Orig,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Orig => f.write_str("orig"),
            Side::Dest => f.write_str("dest"),
        }
    }
}

/// How far the walk has got with one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceKind {
    File,
    Symlink,
    /// A directory whose children have not been listed on this side.
    UnscannedFolder,
    /// A directory whose children have been listed on this side.
    ScannedFolder,
}

impl InstanceKind {
    pub fn is_folder(self) -> bool {
        matches!(self, Self::UnscannedFolder | Self::ScannedFolder)
    }
}

/// One object as it appears in one changeset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    pub entry: TreeEntry,
    /// `None` for the tree root.
    pub parent: Option<Gid>,
    /// 1 for the root, parent depth + 1 otherwise.
    pub depth: u32,
    pub kind: InstanceKind,
}

impl Instance {
    pub fn version(&self) -> Version<'_> {
        Version {
            entry: &self.entry,
            parent: self.parent.as_ref(),
        }
    }
}

/// Everything known about one gid during a comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRecord {
    pub gid: Gid,
    instances: [Option<Instance>; 2],
    /// Smallest depth over the populated instances; the work queue key.
    pub min_depth: u32,
}

impl ObjectRecord {
    fn new(gid: Gid) -> Self {
        Self {
            gid,
            instances: [None, None],
            min_depth: 0,
        }
    }

    pub fn instance(&self, side: Side) -> Option<&Instance> {
        self.instances[side.index()].as_ref()
    }

    pub fn version(&self, side: Side) -> Option<Version<'_>> {
        self.instance(side).map(Instance::version)
    }

    pub fn is_present(&self, side: Side) -> bool {
        self.instances[side.index()].is_some()
    }
}

/// Gid -> record map for one comparison session.
#[derive(Clone, Debug, Default)]
pub struct ObjectTable {
    records: BTreeMap<Gid, ObjectRecord>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, gid: &Gid) -> Option<&ObjectRecord> {
        self.records.get(gid)
    }

    /// Records in gid order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.values()
    }

    /// Return the record for `gid`, inserting an empty one if needed.
    pub fn get_or_create(&mut self, gid: &Gid) -> &mut ObjectRecord {
        self.records
            .entry(gid.clone())
            .or_insert_with(|| ObjectRecord::new(gid.clone()))
    }

    /// Record that `entry` appears on `side` under `parent`.
    ///
    /// Directories are scheduled on the work queue the first time either
    /// side sees them. When the second side arrives and both sides are
    /// unscanned with equal content hashes, the pending expansion is
    /// cancelled: the subtrees are identical. When the first side was
    /// already scanned, the new side is scheduled too, so its children are
    /// paired up with the ones already found.
    pub fn set_instance(
        &mut self,
        queue: &mut WorkQueue,
        side: Side,
        entry: TreeEntry,
        parent: Option<Gid>,
    ) -> DiffResult<()> {
        let gid = entry.gid.clone();
        let depth = match &parent {
            None => 1,
            Some(p) => {
                let parent_depth = self
                    .records
                    .get(p)
                    .and_then(|r| r.instance(side))
                    .map(|i| i.depth)
                    .ok_or_else(|| DiffError::MissingParent {
                        gid: gid.clone(),
                        parent: p.clone(),
                        side,
                    })?;
                parent_depth + 1
            }
        };

        let record = self.get_or_create(&gid);
        if record.is_present(side) {
            return Err(DiffError::DuplicateGid {
                gid,
                location: format!("the {side} tree"),
            });
        }

        let other = record
            .instance(side.other())
            .map(|i| (i.kind, i.entry.entry_type, i.entry.hid));
        if let Some((_, other_type, _)) = other {
            if other_type != entry.entry_type {
                let (orig, dest) = match side {
                    Side::Orig => (entry.entry_type, other_type),
                    Side::Dest => (other_type, entry.entry_type),
                };
                return Err(DiffError::TypeMismatch { gid, orig, dest });
            }
        }

        let previous_min = record.min_depth;
        let min_depth = match other {
            Some(_) => previous_min.min(depth),
            None => depth,
        };

        let kind = match entry.entry_type {
            EntryType::File => InstanceKind::File,
            EntryType::Symlink => InstanceKind::Symlink,
            EntryType::Directory => {
                match other {
                    None => queue.push(depth, &gid),
                    Some((InstanceKind::UnscannedFolder, _, other_hid)) => {
                        if other_hid == entry.hid {
                            if !queue.cancel(previous_min, &gid) {
                                return Err(DiffError::QueueInconsistency {
                                    gid,
                                    depth: previous_min,
                                });
                            }
                            trace!(gid = %gid, "identical subtree, expansion skipped");
                        } else if !queue.reschedule(previous_min, min_depth, &gid) {
                            return Err(DiffError::QueueInconsistency {
                                gid,
                                depth: previous_min,
                            });
                        }
                    }
                    // Peer already expanded; expand this side as well.
                    Some(_) => queue.push(min_depth, &gid),
                }
                InstanceKind::UnscannedFolder
            }
        };

        record.min_depth = min_depth;
        record.instances[side.index()] = Some(Instance {
            entry,
            parent,
            depth,
            kind,
        });
        Ok(())
    }

    /// Flip an unscanned folder to scanned, returning the hash of the tree
    /// node to expand. `None` if there is nothing to expand on that side.
    pub(crate) fn begin_scan(&mut self, gid: &Gid, side: Side) -> Option<ObjectId> {
        let instance = self.records.get_mut(gid)?.instances[side.index()].as_mut()?;
        if instance.kind != InstanceKind::UnscannedFolder {
            return None;
        }
        instance.kind = InstanceKind::ScannedFolder;
        Some(instance.entry.hid)
    }
}
