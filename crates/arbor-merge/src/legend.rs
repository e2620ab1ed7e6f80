//! The four changesets of a merge diamond and how they are labelled.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use arbor_dag::ChangesetDag;
use arbor_types::ObjectId;

use crate::error::{MergeError, MergeResult};

/// Role of a changeset in a merge diamond.
///
/// `A` is the lowest common ancestor, `B` and `C` the first and second
/// parent, `M` the merge. The label doubles as the path domain (`@B/...`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Label {
    A,
    B,
    C,
    M,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::M];

    pub fn domain(self) -> char {
        match self {
            Label::A => 'A',
            Label::B => 'B',
            Label::C => 'C',
            Label::M => 'M',
        }
    }

    pub fn from_domain(domain: char) -> Option<Label> {
        Label::ALL.into_iter().find(|l| l.domain() == domain)
    }

    /// Bit in an existence mask.
    pub fn bit(self) -> u8 {
        match self {
            Label::A => 0b0001,
            Label::B => 0b0010,
            Label::C => 0b0100,
            Label::M => 0b1000,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.domain())
    }
}

/// Label -> changeset id for one merge status report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Legend(BTreeMap<Label, ObjectId>);

impl Legend {
    pub fn get(&self, label: Label) -> Option<&ObjectId> {
        self.0.get(&label)
    }

    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, &ObjectId)> {
        self.0.iter().map(|(l, id)| (*l, id))
    }
}

/// What kind of report a changeset gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeShape {
    /// Single parent, compared two-way against it.
    Fallback { parent: ObjectId, merge: ObjectId },
    Diamond {
        ancestor: ObjectId,
        left: ObjectId,
        right: ObjectId,
        merge: ObjectId,
    },
}

impl MergeShape {
    /// Look up `merge` in the DAG and find its diamond.
    pub fn resolve(
        dag: &ChangesetDag,
        merge: &ObjectId,
        allow_fallback: bool,
    ) -> MergeResult<Self> {
        let Some(node) = dag.get_node(merge) else {
            return Err(MergeError::ChangesetNotInDag(*merge));
        };
        let not_a_merge = || MergeError::NotAMerge {
            merge: *merge,
            parents: node.parents.len(),
        };
        match node.parents.as_slice() {
            [parent] if allow_fallback => Ok(MergeShape::Fallback {
                parent: *parent,
                merge: *merge,
            }),
            [left, right] => {
                let ancestor = dag
                    .common_ancestor(left, right)?
                    .ok_or(MergeError::NoCommonAncestor {
                        left: *left,
                        right: *right,
                    })?;
                debug!(
                    merge = %merge.short_hex(),
                    ancestor = %ancestor.short_hex(),
                    "resolved merge diamond"
                );
                Ok(MergeShape::Diamond {
                    ancestor,
                    left: *left,
                    right: *right,
                    merge: *merge,
                })
            }
            _ => Err(not_a_merge()),
        }
    }

    pub fn legend(&self) -> Legend {
        let pairs: Vec<(Label, ObjectId)> = match *self {
            MergeShape::Fallback { parent, merge } => vec![(Label::A, parent), (Label::M, merge)],
            MergeShape::Diamond {
                ancestor,
                left,
                right,
                merge,
            } => vec![
                (Label::A, ancestor),
                (Label::B, left),
                (Label::C, right),
                (Label::M, merge),
            ],
        };
        Legend(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_dag::DagNode;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    fn dag() -> ChangesetDag {
        let mut dag = ChangesetDag::new();
        dag.add_node(DagNode::new(oid(1), 1, vec![])).unwrap();
        dag.add_node(DagNode::new(oid(2), 2, vec![oid(1)])).unwrap();
        dag.add_node(DagNode::new(oid(3), 2, vec![oid(1)])).unwrap();
        dag.add_node(DagNode::new(oid(4), 3, vec![oid(2), oid(3)])).unwrap();
        dag.add_node(DagNode::new(oid(5), 1, vec![])).unwrap();
        dag
    }

    #[test]
    fn diamond_legend_has_four_labels() {
        let shape = MergeShape::resolve(&dag(), &oid(4), true).unwrap();
        let legend = shape.legend();
        assert_eq!(legend.labels().collect::<Vec<_>>(), Label::ALL);
        assert_eq!(legend.get(Label::A), Some(&oid(1)));
        assert_eq!(legend.get(Label::C), Some(&oid(3)));
    }

    #[test]
    fn single_parent_needs_fallback() {
        let dag = dag();
        let shape = MergeShape::resolve(&dag, &oid(2), true).unwrap();
        assert_eq!(shape.legend().labels().collect::<Vec<_>>(), [Label::A, Label::M]);
        assert!(matches!(
            MergeShape::resolve(&dag, &oid(2), false),
            Err(MergeError::NotAMerge { parents: 1, .. })
        ));
    }

    #[test]
    fn root_and_unknown_changesets_are_rejected() {
        let dag = dag();
        assert!(matches!(
            MergeShape::resolve(&dag, &oid(1), true),
            Err(MergeError::NotAMerge { parents: 0, .. })
        ));
        assert!(matches!(
            MergeShape::resolve(&dag, &oid(9), true),
            Err(MergeError::ChangesetNotInDag(_))
        ));
    }

    #[test]
    fn legend_serializes_as_label_map() {
        let legend = MergeShape::Fallback {
            parent: oid(1),
            merge: oid(2),
        }
        .legend();
        let json = serde_json::to_value(&legend).unwrap();
        assert_eq!(json["A"], oid(1).to_hex());
        assert_eq!(json["M"], oid(2).to_hex());
    }

    #[test]
    fn disjoint_parents_have_no_diamond() {
        let mut dag = dag();
        dag.add_node(DagNode::new(oid(6), 4, vec![oid(4), oid(5)])).unwrap();
        assert!(matches!(
            MergeShape::resolve(&dag, &oid(6), true),
            Err(MergeError::NoCommonAncestor { .. })
        ));
    }
}
