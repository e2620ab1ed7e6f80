//! Status flags for one object across two versions.

use bitflags::bitflags;
use serde::Serialize;

use arbor_store::{EntryType, TreeEntry};
use arbor_types::Gid;

use crate::error::{DiffError, DiffResult};

bitflags! {
    /// Type and change bits for one object.
    ///
    /// Exactly one type bit is set. Change bits describe how the object
    /// differs between the two sides of a comparison; `MULTIPLE_CHANGE` is
    /// derived and set when more than one change bit is present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u32 {
        const FILE = 1 << 0;
        const DIRECTORY = 1 << 1;
        const SYMLINK = 1 << 2;

        const ADDED = 1 << 4;
        const DELETED = 1 << 5;
        const RENAMED = 1 << 6;
        const MOVED = 1 << 7;
        /// Merge status only: the merge itself decided this object's
        /// existence instead of inheriting it from a parent.
        const MERGE_CREATED = 1 << 8;

        const NON_DIR_MODIFIED = 1 << 10;
        const ATTR_CHANGED = 1 << 11;

        const MULTIPLE_CHANGE = 1 << 16;

        const TYPE = Self::FILE.bits() | Self::DIRECTORY.bits() | Self::SYMLINK.bits();
        const STRUCTURAL = Self::ADDED.bits()
            | Self::DELETED.bits()
            | Self::RENAMED.bits()
            | Self::MOVED.bits()
            | Self::MERGE_CREATED.bits();
        const CONTENT = Self::NON_DIR_MODIFIED.bits() | Self::ATTR_CHANGED.bits();
        const CHANGE = Self::STRUCTURAL.bits() | Self::CONTENT.bits();
    }
}

/// Bits counted towards `MULTIPLE_CHANGE`.
const COUNTED: [StatusFlags; 6] = [
    StatusFlags::ADDED,
    StatusFlags::DELETED,
    StatusFlags::RENAMED,
    StatusFlags::MOVED,
    StatusFlags::NON_DIR_MODIFIED,
    StatusFlags::ATTR_CHANGED,
];

impl StatusFlags {
    pub fn for_type(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::File => Self::FILE,
            EntryType::Directory => Self::DIRECTORY,
            EntryType::Symlink => Self::SYMLINK,
        }
    }

    pub fn entry_type(self) -> Option<EntryType> {
        if self.contains(Self::FILE) {
            Some(EntryType::File)
        } else if self.contains(Self::DIRECTORY) {
            Some(EntryType::Directory)
        } else if self.contains(Self::SYMLINK) {
            Some(EntryType::Symlink)
        } else {
            None
        }
    }

    /// `true` if any structural or content bit is set.
    pub fn is_changed(self) -> bool {
        self.intersects(Self::CHANGE)
    }

    fn change_count(self) -> usize {
        COUNTED.iter().filter(|bit| self.contains(**bit)).count()
    }

    /// Recompute `MULTIPLE_CHANGE` from the bits currently set.
    pub fn with_multiple_recomputed(mut self) -> Self {
        self.set(Self::MULTIPLE_CHANGE, self.change_count() > 1);
        self
    }

    pub fn summary(self) -> StatusSummary {
        StatusSummary {
            item_type: self.entry_type().map(|t| t.as_str()).unwrap_or("unknown"),
            added: self.contains(Self::ADDED),
            removed: self.contains(Self::DELETED),
            renamed: self.contains(Self::RENAMED),
            moved: self.contains(Self::MOVED),
            modified: self.contains(Self::NON_DIR_MODIFIED),
            attributes_changed: self.contains(Self::ATTR_CHANGED),
            multiple: self.contains(Self::MULTIPLE_CHANGE),
            merge_created: self.contains(Self::MERGE_CREATED),
        }
    }

    /// Compact letters for terminal output, e.g. `RV` for renamed and
    /// moved. `-` when nothing changed.
    pub fn short_code(self) -> String {
        let code: String = [
            (Self::ADDED, 'A'),
            (Self::DELETED, 'D'),
            (Self::RENAMED, 'R'),
            (Self::MOVED, 'V'),
            (Self::NON_DIR_MODIFIED, 'M'),
            (Self::ATTR_CHANGED, 'T'),
            (Self::MERGE_CREATED, '+'),
        ]
        .into_iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, c)| c)
        .collect();
        if code.is_empty() {
            "-".into()
        } else {
            code
        }
    }
}

/// Named booleans for one object's status, as rendered in reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub item_type: &'static str,
    pub added: bool,
    pub removed: bool,
    pub renamed: bool,
    pub moved: bool,
    pub modified: bool,
    pub attributes_changed: bool,
    pub multiple: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub merge_created: bool,
}

/// The parts of an instance that flags are computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version<'a> {
    pub entry: &'a TreeEntry,
    /// `None` for the tree root.
    pub parent: Option<&'a Gid>,
}

/// Flags for one object given its orig and dest versions.
pub fn compute_flags(
    orig: Option<Version<'_>>,
    dest: Option<Version<'_>>,
) -> DiffResult<StatusFlags> {
    let flags = match (orig, dest) {
        (Some(o), Some(d)) => {
            let mut flags = StatusFlags::for_type(d.entry.entry_type);
            if o.parent != d.parent {
                flags |= StatusFlags::MOVED;
            }
            if o.entry.name != d.entry.name {
                flags |= StatusFlags::RENAMED;
            }
            if o.entry.hid != d.entry.hid && !d.entry.is_directory() {
                flags |= StatusFlags::NON_DIR_MODIFIED;
            }
            if o.entry.attrs != d.entry.attrs {
                flags |= StatusFlags::ATTR_CHANGED;
            }
            flags
        }
        (Some(o), None) => StatusFlags::for_type(o.entry.entry_type) | StatusFlags::DELETED,
        (None, Some(d)) => StatusFlags::for_type(d.entry.entry_type) | StatusFlags::ADDED,
        (None, None) => return Err(DiffError::NoInstance),
    };
    Ok(flags.with_multiple_recomputed())
}
