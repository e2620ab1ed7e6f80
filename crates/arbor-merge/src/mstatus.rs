//! Merge status: how a merge changeset relates to its parents and their
//! common ancestor.
//!
//! The six pairwise comparisons of the diamond share the session's tree
//! node cache, so subtrees common to several changesets are decoded once.

use serde::Serialize;
use tracing::{debug, trace};

use arbor_dag::ChangesetDag;
use arbor_diff::{
    ChangeRecord, DiffOptions, DiffSession, RepoView, SideDetail, StatusFlags, StatusSummary,
};
use arbor_types::{Gid, ObjectId};

use crate::accumulate::{Accumulated, Accumulator, Pair};
use crate::config::MstatusOptions;
use crate::error::MergeResult;
use crate::existence::Existence;
use crate::legend::{Label, Legend, MergeShape};
use crate::qualify::qualify;

/// Labels consulted for the reported path, most current first.
const PATH_ORDER: [Label; 4] = [Label::M, Label::B, Label::C, Label::A];

/// One object's merge status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeChangeRecord {
    pub gid: Gid,
    pub existence: Existence,
    #[serde(skip)]
    pub flags: StatusFlags,
    pub status: StatusSummary,
    pub path: String,
    /// Existence headings followed by qualification headlines.
    pub headings: Vec<String>,
    /// Per-side details in A, B, C, M order.
    pub sides: Vec<SideDetail>,
}

impl MergeChangeRecord {
    fn build(gid: Gid, existence: Existence, acc: &Accumulated) -> Self {
        let qualified = qualify(existence.strategy(), acc);
        let flags = (acc.type_flags() | existence.flags() | qualified.flags)
            .with_multiple_recomputed();
        let mut headings = existence.headings();
        headings.extend(qualified.headlines);
        let path = PATH_ORDER
            .iter()
            .find_map(|label| acc.side(*label))
            .map(|side| side.path.clone())
            .unwrap_or_default();
        Self {
            gid,
            existence,
            flags,
            status: flags.summary(),
            path,
            headings,
            sides: acc.sides().cloned().collect(),
        }
    }

    pub fn side(&self, label: Label) -> Option<&SideDetail> {
        self.sides.iter().find(|s| s.domain == label.domain())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "records", rename_all = "lowercase")]
pub enum MergeChanges {
    /// Single-parent changeset: an ordinary two-way status against it.
    Fallback(Vec<ChangeRecord>),
    Diamond(Vec<MergeChangeRecord>),
}

impl MergeChanges {
    pub fn len(&self) -> usize {
        match self {
            MergeChanges::Fallback(records) => records.len(),
            MergeChanges::Diamond(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of [`mstatus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeStatus {
    pub legend: Legend,
    pub changes: MergeChanges,
}

/// Merge status of `merge`.
///
/// A changeset with two parents is compared against both of them and
/// their lowest common ancestor. With `allow_fallback`, a single-parent
/// changeset gets a plain two-way status against its parent instead.
pub fn mstatus<R: RepoView + ?Sized>(
    session: &mut DiffSession<'_, R>,
    dag: &ChangesetDag,
    merge: &ObjectId,
    opts: &MstatusOptions,
) -> MergeResult<MergeStatus> {
    let shape = MergeShape::resolve(dag, merge, opts.allow_fallback)?;
    let legend = shape.legend();

    let changes = match shape {
        MergeShape::Fallback { parent, merge } => {
            let mut diff_opts =
                DiffOptions::with_domains(Label::A.domain(), Label::M.domain());
            diff_opts.sort = opts.sort;
            let records = session.diff(&parent, &merge, &diff_opts)?;
            debug!(
                merge = %merge.short_hex(),
                changed = records.len(),
                "single parent, fell back to two-way status"
            );
            MergeChanges::Fallback(records)
        }
        MergeShape::Diamond { .. } => {
            let mut records = diamond(session, &legend)?;
            if opts.sort {
                records.sort_by(|a, b| a.path.cmp(&b.path));
            }
            MergeChanges::Diamond(records)
        }
    };
    Ok(MergeStatus { legend, changes })
}

fn diamond<R: RepoView + ?Sized>(
    session: &mut DiffSession<'_, R>,
    legend: &Legend,
) -> MergeResult<Vec<MergeChangeRecord>> {
    let mut accumulator = Accumulator::new();
    for pair in Pair::ALL {
        let (x, y) = pair.labels();
        let (Some(orig), Some(dest)) = (legend.get(x), legend.get(y)) else {
            continue;
        };
        if orig == dest {
            debug!(pair = ?pair, "identical changesets, no differences");
            continue;
        }
        let opts = DiffOptions::with_domains(x.domain(), y.domain()).unsorted();
        let records = session.diff(orig, dest, &opts)?;
        trace!(pair = ?pair, changed = records.len(), "pairwise comparison");
        for record in &records {
            accumulator.add(pair, record);
        }
    }

    let objects = accumulator.len();
    let mut records = Vec::with_capacity(objects);
    for (gid, existence, acc) in accumulator.into_cases()? {
        trace!(gid = %gid, case = %existence, "merge case");
        records.push(MergeChangeRecord::build(gid, existence, &acc));
    }
    debug!(
        objects,
        cache_misses = session.cache_stats().misses,
        "merge status complete"
    );
    Ok(records)
}
