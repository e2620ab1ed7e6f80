//! Change records produced by a comparison.

use std::fmt;

use serde::Serialize;

use arbor_store::EntryType;
use arbor_types::{Gid, ObjectId};

use crate::closure::ClosureStats;
use crate::config::DiffOptions;
use crate::error::DiffResult;
use crate::flags::{StatusFlags, StatusSummary, Version};
use crate::repo::RepoView;
use crate::table::{ObjectTable, Side};

/// One object as it appears on one side of a change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SideDetail {
    pub label: String,
    pub domain: char,
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Gid>,
    /// Content hash; `None` for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hid: Option<ObjectId>,
    pub attrs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<SymlinkTarget>,
}

/// A symlink's target as stored. Targets that are not valid UTF-8 are kept
/// hex-encoded so no byte is lost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "encoding", content = "value", rename_all = "lowercase")]
pub enum SymlinkTarget {
    Utf8(String),
    Hex(String),
}

impl SymlinkTarget {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => SymlinkTarget::Utf8(text),
            Err(e) => SymlinkTarget::Hex(hex::encode(e.into_bytes())),
        }
    }

    /// The target text, if it was valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SymlinkTarget::Utf8(text) => Some(text),
            SymlinkTarget::Hex(_) => None,
        }
    }

    /// The original bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            SymlinkTarget::Utf8(text) => text.as_bytes().to_vec(),
            SymlinkTarget::Hex(encoded) => hex::decode(encoded).unwrap_or_default(),
        }
    }
}

impl fmt::Display for SymlinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymlinkTarget::Utf8(text) => f.write_str(text),
            SymlinkTarget::Hex(encoded) => write!(f, "hex:{encoded}"),
        }
    }
}

impl SideDetail {
    pub(crate) fn new<R: RepoView + ?Sized>(
        repo: &R,
        label: &str,
        domain: char,
        path: String,
        version: Version<'_>,
    ) -> DiffResult<Self> {
        let entry = version.entry;
        let symlink_target = match entry.entry_type {
            EntryType::Symlink => Some(SymlinkTarget::from_bytes(
                repo.fetch_blob_bytes(&entry.hid)?,
            )),
            _ => None,
        };
        Ok(Self {
            label: label.to_string(),
            domain,
            path,
            name: entry.name.clone(),
            parent: version.parent.cloned(),
            hid: (!entry.is_directory()).then_some(entry.hid),
            attrs: entry.attrs,
            symlink_target,
        })
    }
}

/// One changed object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub gid: Gid,
    #[serde(skip)]
    pub flags: StatusFlags,
    pub status: StatusSummary,
    /// Dest path when present, otherwise orig path.
    pub path: String,
    /// One entry per side the object exists on, orig first.
    pub sides: Vec<SideDetail>,
}

impl ChangeRecord {
    /// Build a record from the per-side `(path, version)` pairs, orig first.
    pub(crate) fn build<R: RepoView + ?Sized>(
        repo: &R,
        gid: Gid,
        flags: StatusFlags,
        versions: [Option<(String, Version<'_>)>; 2],
        opts: &DiffOptions,
    ) -> DiffResult<Self> {
        let mut sides = Vec::with_capacity(2);
        for side in Side::BOTH {
            if let Some((path, version)) = &versions[side.index()] {
                sides.push(SideDetail::new(
                    repo,
                    &opts.labels[side.index()],
                    opts.domains[side.index()],
                    path.clone(),
                    *version,
                )?);
            }
        }
        let path = sides.last().map(|s| s.path.clone()).unwrap_or_default();
        Ok(Self {
            gid,
            flags,
            status: flags.summary(),
            path,
            sides,
        })
    }

    pub fn side(&self, domain: char) -> Option<&SideDetail> {
        self.sides.iter().find(|s| s.domain == domain)
    }
}

/// Full output of one comparison: records plus the state behind them.
#[derive(Debug)]
pub struct Comparison {
    pub records: Vec<ChangeRecord>,
    pub table: ObjectTable,
    pub stats: ClosureStats,
}

pub(crate) fn sort_by_path(records: &mut [ChangeRecord]) {
    records.sort_by(|a, b| a.path.cmp(&b.path));
}
