//! Status restricted to selected items.
//!
//! Every filtered query runs one ordinary comparison, so subtrees that are
//! identical on both sides are never read. Path inputs are then located by
//! walking tree nodes along the path through the session cache. Files and
//! symlinks select their own record; directories keep the records that sit
//! within `depth` levels below the directory on either side.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use arbor_types::{Gid, ObjectId};

use crate::closure::root_entry;
use crate::config::DiffOptions;
use crate::error::{DiffError, DiffResult};
use crate::paths::PathResolver;
use crate::repo::RepoView;
use crate::session::DiffSession;
use crate::status::{sort_by_path, ChangeRecord};
use crate::table::{ObjectTable, Side};

/// An item named by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusInput {
    Gid(Gid),
    /// Tree-relative path, optionally prefixed with `@<domain>/`.
    Path(String),
}

impl StatusInput {
    /// The path with surrounding slashes removed and, when it starts with
    /// `@<domain>/` for one of `domains`, that prefix stripped. `None` for
    /// gid inputs.
    pub fn relative_path(&self, domains: [char; 2]) -> Option<&str> {
        let StatusInput::Path(path) = self else {
            return None;
        };
        let stripped = path
            .strip_prefix('@')
            .and_then(|rest| {
                let mut chars = rest.chars();
                let domain = chars.next()?;
                let tail = chars.as_str();
                let prefixed = domains.contains(&domain)
                    && (tail.is_empty() || tail.starts_with('/'));
                prefixed.then_some(tail)
            })
            .unwrap_or(path);
        Some(stripped.trim_matches('/'))
    }
}

impl fmt::Display for StatusInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusInput::Gid(gid) => write!(f, "gid:{gid}"),
            StatusInput::Path(path) => f.write_str(path),
        }
    }
}

/// `gid:<gid>` selects by gid, anything else is a path.
impl FromStr for StatusInput {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("gid:") {
            Some(gid) => Gid::new(gid)
                .map(StatusInput::Gid)
                .map_err(|e| DiffError::InvalidOptions(e.to_string())),
            None => Ok(StatusInput::Path(s.to_string())),
        }
    }
}

/// Which items to report, and how deep below directories.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub inputs: Vec<StatusInput>,
    /// `None` is unlimited; `Some(0)` reports only the item itself.
    pub depth: Option<usize>,
}

/// A selected item the closure reached, with its historical paths.
struct Target {
    gid: Gid,
    paths: [Option<String>; 2],
    directory: bool,
}

impl<'r, R: RepoView + ?Sized> DiffSession<'r, R> {
    /// [`DiffSession::diff`] restricted to `filter.inputs`.
    pub fn diff_filtered(
        &mut self,
        orig: &ObjectId,
        dest: &ObjectId,
        filter: &FilterOptions,
        opts: &DiffOptions,
    ) -> DiffResult<Vec<ChangeRecord>> {
        let changesets = [*orig, *dest];
        let cmp = self.compare(orig, dest, &opts.clone().unsorted())?;
        let by_gid: HashMap<&Gid, &ChangeRecord> =
            cmp.records.iter().map(|r| (&r.gid, r)).collect();
        let paths = PathResolver::new(&cmp.table, opts.domains);

        let mut targets = Vec::with_capacity(filter.inputs.len());
        for input in &filter.inputs {
            let target = self.resolve_input(input, &changesets, &cmp.table, &paths, opts)?;
            targets.extend(target);
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for target in &targets {
            if !target.directory || filter.depth == Some(0) {
                if let Some(record) = by_gid.get(&target.gid) {
                    if seen.insert(&record.gid) {
                        out.push((*record).clone());
                    }
                }
                continue;
            }
            for record in &cmp.records {
                if within(target, record, filter.depth, opts) && seen.insert(&record.gid) {
                    out.push(record.clone());
                }
            }
        }

        if opts.sort {
            sort_by_path(&mut out);
        }
        debug!(
            inputs = filter.inputs.len(),
            reached = targets.len(),
            depth = ?filter.depth,
            changed = out.len(),
            "filtered comparison complete"
        );
        Ok(out)
    }

    /// Locate an input in the comparison's object table. `None` when the
    /// item exists but the closure never reached it: it sits inside a
    /// subtree that is identical on both sides, so nothing below it changed.
    fn resolve_input(
        &mut self,
        input: &StatusInput,
        changesets: &[ObjectId; 2],
        table: &ObjectTable,
        paths: &PathResolver<'_>,
        opts: &DiffOptions,
    ) -> DiffResult<Option<Target>> {
        let gid = match input {
            StatusInput::Gid(gid) => gid.clone(),
            StatusInput::Path(_) => {
                let rel = input.relative_path(opts.domains).unwrap_or_default();
                let mut found = None;
                for changeset in [&changesets[1], &changesets[0]] {
                    if let Some(gid) = self.find_by_path(changeset, rel)? {
                        found = Some(gid);
                        break;
                    }
                }
                found.ok_or_else(|| DiffError::InputNotFound(input.to_string()))?
            }
        };

        let Some(record) = table.get(&gid) else {
            if let StatusInput::Gid(_) = input {
                let repo = self.repo();
                let mut present = false;
                for changeset in changesets {
                    if repo.resolve_gid_to_entry(&gid, changeset)?.is_some() {
                        present = true;
                        break;
                    }
                }
                if !present {
                    return Err(DiffError::InputNotFound(input.to_string()));
                }
            }
            debug!(input = %input, "input lies in an unchanged subtree");
            return Ok(None);
        };

        let directory = Side::BOTH
            .into_iter()
            .filter_map(|side| record.instance(side))
            .any(|instance| instance.entry.is_directory());
        Ok(Some(Target {
            paths: [
                paths.resolve(&gid, Side::Orig)?,
                paths.resolve(&gid, Side::Dest)?,
            ],
            gid,
            directory,
        }))
    }

    /// Walk tree nodes from the root following `rel`'s components.
    fn find_by_path(&mut self, changeset: &ObjectId, rel: &str) -> DiffResult<Option<Gid>> {
        let repo = self.repo();
        let super_root = repo.resolve_root_hash(changeset)?;
        let node = self.cache_mut().load(repo, &super_root)?;
        let mut entry = root_entry(&node, &super_root)?.clone();
        for component in rel.split('/').filter(|c| !c.is_empty()) {
            if !entry.is_directory() {
                return Ok(None);
            }
            let node = self.cache_mut().load(repo, &entry.hid)?;
            match node.find_by_name(component) {
                Some(child) => entry = child.clone(),
                None => return Ok(None),
            }
        }
        Ok(Some(entry.gid))
    }
}

/// `true` if `record` lies at most `depth` levels below the target
/// directory on some side.
fn within(
    target: &Target,
    record: &ChangeRecord,
    depth: Option<usize>,
    opts: &DiffOptions,
) -> bool {
    Side::BOTH.into_iter().any(|side| {
        let Some(prefix) = &target.paths[side.index()] else {
            return false;
        };
        let Some(detail) = record.side(opts.domains[side.index()]) else {
            return false;
        };
        let Some(extra) = detail.path.strip_prefix(prefix.as_str()) else {
            return false;
        };
        let level = if extra.is_empty() {
            0
        } else {
            extra.trim_end_matches('/').matches('/').count() + 1
        };
        depth.map_or(true, |d| level <= d)
    })
}
