//! The read-only repository interface the engine consumes.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use tracing::debug;

use arbor_store::{Blob, Changeset, ObjectStore, TreeEntry, TreeNode};
use arbor_types::{Gid, ObjectId};

use crate::closure::root_entry;
use crate::error::{DiffError, DiffResult};
use crate::flags::Version;

/// Where a gid lives in one changeset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GidLocation {
    /// Tree-relative path: `""` for the root, `dir/`, `dir/foo.txt`.
    pub path: String,
    /// `None` for the root.
    pub parent: Option<Gid>,
    pub entry: TreeEntry,
}

impl GidLocation {
    pub fn version(&self) -> Version<'_> {
        Version {
            entry: &self.entry,
            parent: self.parent.as_ref(),
        }
    }
}

/// Storage operations needed by the comparison engine.
///
/// Implementations must be read-only for the duration of a comparison;
/// every object is addressed by its content hash and never changes.
pub trait RepoView {
    /// Load a tree node. `NotFound` if absent (sparse repository).
    fn fetch_tree_node(&self, hid: &ObjectId) -> DiffResult<TreeNode>;

    /// Raw blob bytes. Used for symlink targets.
    fn fetch_blob_bytes(&self, hid: &ObjectId) -> DiffResult<Vec<u8>>;

    /// Map a changeset id to its super-root tree node hash.
    fn resolve_root_hash(&self, changeset: &ObjectId) -> DiffResult<ObjectId>;

    /// Point lookup of one gid in one changeset.
    fn resolve_gid_to_entry(
        &self,
        gid: &Gid,
        changeset: &ObjectId,
    ) -> DiffResult<Option<GidLocation>>;
}

type GidIndex = HashMap<Gid, GidLocation>;

/// [`RepoView`] over any [`ObjectStore`].
///
/// Gid lookups are served from a per-changeset index built by one walk of
/// the tree the first time that changeset is queried.
pub struct StoreRepo<S> {
    store: S,
    gid_index: RwLock<HashMap<ObjectId, Arc<GidIndex>>>,
}

impl<S: ObjectStore> StoreRepo<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            gid_index: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_changeset(&self, id: &ObjectId) -> DiffResult<Changeset> {
        Ok(Changeset::from_stored_object(&self.store.read_required(id)?)?)
    }

    fn index_for(&self, changeset: &ObjectId) -> DiffResult<Arc<GidIndex>> {
        if let Some(index) = self.gid_index.read().expect("lock poisoned").get(changeset) {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(self.build_index(changeset)?);
        self.gid_index
            .write()
            .expect("lock poisoned")
            .insert(*changeset, Arc::clone(&index));
        Ok(index)
    }

    fn build_index(&self, changeset: &ObjectId) -> DiffResult<GidIndex> {
        let super_root = self.resolve_root_hash(changeset)?;
        let node = self.fetch_tree_node(&super_root)?;
        let root = root_entry(&node, &super_root)?.clone();

        let duplicate = |gid: Gid| DiffError::DuplicateGid {
            gid,
            location: format!("changeset {}", changeset.short_hex()),
        };

        let mut index = GidIndex::new();
        let mut pending = VecDeque::new();
        pending.push_back((root.gid.clone(), root.hid, String::new()));
        index.insert(
            root.gid.clone(),
            GidLocation {
                path: String::new(),
                parent: None,
                entry: root,
            },
        );

        while let Some((dir, hid, dir_path)) = pending.pop_front() {
            for entry in self.fetch_tree_node(&hid)?.entries {
                let mut path = format!("{dir_path}{}", entry.name);
                if entry.is_directory() {
                    path.push('/');
                    pending.push_back((entry.gid.clone(), entry.hid, path.clone()));
                }
                let gid = entry.gid.clone();
                let location = GidLocation {
                    path,
                    parent: Some(dir.clone()),
                    entry,
                };
                if index.insert(gid.clone(), location).is_some() {
                    return Err(duplicate(gid));
                }
            }
        }
        debug!(changeset = %changeset.short_hex(), objects = index.len(), "built gid index");
        Ok(index)
    }
}

impl<S: ObjectStore> RepoView for StoreRepo<S> {
    fn fetch_tree_node(&self, hid: &ObjectId) -> DiffResult<TreeNode> {
        Ok(TreeNode::from_stored_object(&self.store.read_required(hid)?)?)
    }

    fn fetch_blob_bytes(&self, hid: &ObjectId) -> DiffResult<Vec<u8>> {
        Ok(Blob::from_stored_object(&self.store.read_required(hid)?)?.data)
    }

    fn resolve_root_hash(&self, changeset: &ObjectId) -> DiffResult<ObjectId> {
        Ok(self.load_changeset(changeset)?.root)
    }

    fn resolve_gid_to_entry(
        &self,
        gid: &Gid,
        changeset: &ObjectId,
    ) -> DiffResult<Option<GidLocation>> {
        Ok(self.index_for(changeset)?.get(gid).cloned())
    }
}

impl<S> std::fmt::Debug for StoreRepo<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRepo").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_store::{
        write_changeset, EntryType, InMemoryObjectStore, SnapshotBuilder, StoreError,
    };

    fn commit(repo: &StoreRepo<InMemoryObjectStore>, builder: SnapshotBuilder) -> ObjectId {
        let root = builder.write(repo.store()).unwrap();
        write_changeset(
            repo.store(),
            &Changeset {
                root,
                parents: vec![],
                generation: 1,
                message: String::new(),
            },
        )
        .unwrap()
    }

    fn gid(s: &str) -> Gid {
        Gid::new(s).unwrap()
    }

    #[test]
    fn gid_lookup_returns_tree_relative_paths() {
        let repo = StoreRepo::new(InMemoryObjectStore::new());
        let cs = commit(
            &repo,
            SnapshotBuilder::new("root")
                .dir("d1", "root", "dir")
                .file("f1", "d1", "foo.txt", "hello"),
        );

        let root = repo.resolve_gid_to_entry(&gid("root"), &cs).unwrap().unwrap();
        assert_eq!(root.path, "");
        assert_eq!(root.parent, None);

        let dir = repo.resolve_gid_to_entry(&gid("d1"), &cs).unwrap().unwrap();
        assert_eq!(dir.path, "dir/");

        let file = repo.resolve_gid_to_entry(&gid("f1"), &cs).unwrap().unwrap();
        assert_eq!(file.path, "dir/foo.txt");
        assert_eq!(file.parent, Some(gid("d1")));
        assert_eq!(file.entry.entry_type, EntryType::File);

        assert!(repo.resolve_gid_to_entry(&gid("zz"), &cs).unwrap().is_none());
    }

    #[test]
    fn symlink_target_comes_from_blob() {
        let repo = StoreRepo::new(InMemoryObjectStore::new());
        let cs = commit(
            &repo,
            SnapshotBuilder::new("root").symlink("l1", "root", "link", "target/file"),
        );
        let link = repo.resolve_gid_to_entry(&gid("l1"), &cs).unwrap().unwrap();
        assert_eq!(repo.fetch_blob_bytes(&link.entry.hid).unwrap(), b"target/file");
    }

    #[test]
    fn unknown_changeset_is_not_found() {
        let repo = StoreRepo::new(InMemoryObjectStore::new());
        let err = repo
            .resolve_root_hash(&ObjectId::from_hash([9; 32]))
            .unwrap_err();
        assert!(matches!(err, DiffError::Store(StoreError::NotFound(_))));
    }
}
