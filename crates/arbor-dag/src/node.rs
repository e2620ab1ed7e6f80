//! DAG node: one committed changeset and its parent edges.

use serde::{Deserialize, Serialize};

use arbor_types::ObjectId;

/// A changeset in the history graph.
///
/// Nodes are immutable once added; the graph only ever grows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagNode {
    /// Changeset id.
    pub id: ObjectId,
    /// Distance from the oldest root, 1 for a root commit. Always larger
    /// than every parent's generation.
    pub generation: u64,
    /// Parent changesets; two for a merge, none for a root.
    pub parents: Vec<ObjectId>,
}

impl DagNode {
    pub fn new(id: ObjectId, generation: u64, parents: Vec<ObjectId>) -> Self {
        Self {
            id,
            generation,
            parents,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    #[test]
    fn root_and_merge_predicates() {
        let root = DagNode::new(oid(1), 1, vec![]);
        assert!(root.is_root());
        assert!(!root.is_merge());

        let merge = DagNode::new(oid(4), 3, vec![oid(2), oid(3)]);
        assert!(!merge.is_root());
        assert!(merge.is_merge());
    }
}
