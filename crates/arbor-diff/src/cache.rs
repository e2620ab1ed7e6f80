//! Memoized tree node loading.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use arbor_store::TreeNode;
use arbor_types::ObjectId;

use crate::error::DiffResult;
use crate::repo::RepoView;

/// Hit/miss counters for a [`TreeNodeCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cached: usize,
}

/// Tree nodes decoded so far, keyed by content hash.
///
/// Nodes are immutable, so a cached node never goes stale. The cache only
/// grows; it is owned by a single session and dropped with it.
#[derive(Debug, Default)]
pub struct TreeNodeCache {
    nodes: HashMap<ObjectId, Arc<TreeNode>>,
    hits: u64,
    misses: u64,
}

impl TreeNodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node for `hid`, fetching it from `repo` on first use.
    pub fn load<R: RepoView + ?Sized>(
        &mut self,
        repo: &R,
        hid: &ObjectId,
    ) -> DiffResult<Arc<TreeNode>> {
        if let Some(node) = self.nodes.get(hid) {
            self.hits += 1;
            return Ok(Arc::clone(node));
        }
        self.misses += 1;
        let node = Arc::new(repo.fetch_tree_node(hid)?);
        trace!(hid = %hid.short_hex(), entries = node.len(), "tree node loaded");
        self.nodes.insert(*hid, Arc::clone(&node));
        Ok(node)
    }

    pub fn contains(&self, hid: &ObjectId) -> bool {
        self.nodes.contains_key(hid)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            cached: self.nodes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffError;
    use crate::repo::StoreRepo;
    use arbor_store::{InMemoryObjectStore, ObjectStore, StoreError};

    #[test]
    fn second_load_is_a_hit() {
        let repo = StoreRepo::new(InMemoryObjectStore::new());
        let hid = repo
            .store()
            .write(&TreeNode::default().to_stored_object().unwrap())
            .unwrap();

        let mut cache = TreeNodeCache::new();
        let a = cache.load(&repo, &hid).unwrap();
        let b = cache.load(&repo, &hid).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                cached: 1
            }
        );
    }

    #[test]
    fn missing_node_is_not_cached() {
        let repo = StoreRepo::new(InMemoryObjectStore::new());
        let hid = ObjectId::from_hash([3; 32]);
        let mut cache = TreeNodeCache::new();
        let err = cache.load(&repo, &hid).unwrap_err();
        assert!(matches!(err, DiffError::Store(StoreError::NotFound(_))));
        assert!(!cache.contains(&hid));
    }
}
