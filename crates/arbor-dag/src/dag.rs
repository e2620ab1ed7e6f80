//! The changeset DAG and its ancestry queries.
//!
//! # Invariants
//!
//! - The graph is acyclic: parents must exist before a child is added, and
//!   a child's generation is strictly larger than each parent's.
//! - Changeset ids are unique within the DAG.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use arbor_types::ObjectId;

use crate::error::{DagError, DagResult};
use crate::node::DagNode;

/// History graph of committed changesets.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChangesetDag {
    nodes: HashMap<ObjectId, DagNode>,
    /// Forward edges: parent -> children.
    children: HashMap<ObjectId, Vec<ObjectId>>,
}

impl ChangesetDag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a changeset. All parents must already be present.
    pub fn add_node(&mut self, node: DagNode) -> DagResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(DagError::DuplicateNode(node.id));
        }
        for parent in &node.parents {
            let Some(p) = self.nodes.get(parent) else {
                return Err(DagError::DanglingParent {
                    node: node.id,
                    parent: *parent,
                });
            };
            if p.generation >= node.generation {
                return Err(DagError::GenerationOrder {
                    node: node.id,
                    generation: node.generation,
                    parent: *parent,
                    parent_generation: p.generation,
                });
            }
        }

        for parent in &node.parents {
            self.children.entry(*parent).or_default().push(node.id);
        }
        debug!(node = %node.id.short_hex(), generation = node.generation, "added changeset");
        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn get_node(&self, id: &ObjectId) -> Option<&DagNode> {
        self.nodes.get(id)
    }

    /// All changesets, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &DagNode> {
        self.nodes.values()
    }

    /// Parents of a changeset, in commit order.
    pub fn parents(&self, id: &ObjectId) -> DagResult<&[ObjectId]> {
        self.nodes
            .get(id)
            .map(|n| n.parents.as_slice())
            .ok_or(DagError::NodeNotFound(*id))
    }

    /// Direct children of a changeset.
    pub fn children(&self, id: &ObjectId) -> &[ObjectId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every ancestor of `id`, including `id` itself.
    pub fn ancestors(&self, id: &ObjectId) -> HashSet<ObjectId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        if self.nodes.contains_key(id) {
            visited.insert(*id);
            queue.push_back(*id);
        }
        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.get(&current) {
                for parent in &node.parents {
                    if visited.insert(*parent) {
                        queue.push_back(*parent);
                    }
                }
            }
        }
        visited
    }

    /// `true` if `ancestor` is reachable from `descendant` by parent edges
    /// (a changeset is its own ancestor).
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> bool {
        self.ancestors(descendant).contains(ancestor)
    }

    /// Lowest common ancestor of two changesets.
    ///
    /// Intersects the two ancestor sets and picks the member with the
    /// highest generation; ties (criss-cross histories) go to the smaller
    /// id so the answer is deterministic.
    pub fn common_ancestor(&self, a: &ObjectId, b: &ObjectId) -> DagResult<Option<ObjectId>> {
        for id in [a, b] {
            if !self.nodes.contains_key(id) {
                return Err(DagError::NodeNotFound(*id));
            }
        }
        if a == b {
            return Ok(Some(*a));
        }

        let ancestors_a = self.ancestors(a);
        let ancestors_b = self.ancestors(b);
        let lca = ancestors_a
            .intersection(&ancestors_b)
            .filter_map(|id| self.nodes.get(id))
            .max_by(|x, y| {
                x.generation
                    .cmp(&y.generation)
                    .then_with(|| y.id.cmp(&x.id))
            })
            .map(|n| n.id);
        debug!(a = %a.short_hex(), b = %b.short_hex(), lca = ?lca, "common ancestor");
        Ok(lca)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> DagResult<()> {
        for node in self.nodes.values() {
            for parent in &node.parents {
                let p = self.nodes.get(parent).ok_or(DagError::DanglingParent {
                    node: node.id,
                    parent: *parent,
                })?;
                if p.generation >= node.generation {
                    return Err(DagError::GenerationOrder {
                        node: node.id,
                        generation: node.generation,
                        parent: *parent,
                        parent_generation: p.generation,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 32])
    }

    fn add(dag: &mut ChangesetDag, id: u8, generation: u64, parents: &[u8]) {
        dag.add_node(DagNode::new(
            oid(id),
            generation,
            parents.iter().map(|p| oid(*p)).collect(),
        ))
        .unwrap();
    }

    /// 1 -> 2 -> 4
    ///  \-> 3 -/
    fn diamond() -> ChangesetDag {
        let mut dag = ChangesetDag::new();
        add(&mut dag, 1, 1, &[]);
        add(&mut dag, 2, 2, &[1]);
        add(&mut dag, 3, 2, &[1]);
        add(&mut dag, 4, 3, &[2, 3]);
        dag
    }

    #[test]
    fn rejects_duplicates_and_dangling_parents() {
        let mut dag = diamond();
        assert!(matches!(
            dag.add_node(DagNode::new(oid(1), 1, vec![])),
            Err(DagError::DuplicateNode(_))
        ));
        assert!(matches!(
            dag.add_node(DagNode::new(oid(9), 5, vec![oid(8)])),
            Err(DagError::DanglingParent { .. })
        ));
    }

    #[test]
    fn rejects_generation_not_above_parent() {
        let mut dag = diamond();
        let err = dag
            .add_node(DagNode::new(oid(5), 2, vec![oid(4)]))
            .unwrap_err();
        assert!(matches!(err, DagError::GenerationOrder { .. }));
    }

    #[test]
    fn diamond_lca_is_the_fork_point() {
        let dag = diamond();
        assert_eq!(dag.common_ancestor(&oid(2), &oid(3)).unwrap(), Some(oid(1)));
        assert_eq!(dag.parents(&oid(4)).unwrap(), &[oid(2), oid(3)]);
        assert_eq!(dag.children(&oid(1)).len(), 2);
        assert_eq!(dag.nodes().filter(|n| n.is_merge()).count(), 1);
    }

    #[test]
    fn lca_of_ancestor_pair_is_the_ancestor() {
        let dag = diamond();
        assert_eq!(dag.common_ancestor(&oid(1), &oid(4)).unwrap(), Some(oid(1)));
        assert_eq!(dag.common_ancestor(&oid(2), &oid(2)).unwrap(), Some(oid(2)));
        assert!(dag.is_ancestor(&oid(2), &oid(4)));
        assert!(!dag.is_ancestor(&oid(2), &oid(3)));
    }

    #[test]
    fn disjoint_roots_have_no_lca() {
        let mut dag = ChangesetDag::new();
        add(&mut dag, 1, 1, &[]);
        add(&mut dag, 2, 1, &[]);
        assert_eq!(dag.common_ancestor(&oid(1), &oid(2)).unwrap(), None);
    }

    #[test]
    fn unknown_changeset_is_an_error() {
        let dag = diamond();
        assert!(matches!(
            dag.common_ancestor(&oid(1), &oid(42)),
            Err(DagError::NodeNotFound(_))
        ));
        assert!(dag.parents(&oid(42)).is_err());
    }

    #[test]
    fn lca_prefers_highest_generation() {
        // 1 -> 2 -> 3 -> 5
        //       \-> 4 -/   (LCA of 3 and 4 is 2, not 1)
        let mut dag = ChangesetDag::new();
        add(&mut dag, 1, 1, &[]);
        add(&mut dag, 2, 2, &[1]);
        add(&mut dag, 3, 3, &[2]);
        add(&mut dag, 4, 3, &[2]);
        assert_eq!(dag.common_ancestor(&oid(3), &oid(4)).unwrap(), Some(oid(2)));
        dag.validate().unwrap();
    }
}
