//! Writing snapshots into the store.
//!
//! A snapshot is described either flat, gid by gid with an explicit parent
//! ([`SnapshotBuilder`]), or as a nested [`NodeSpec`] tree (the form used by
//! repository manifests). Writing stores every blob and tree node bottom-up
//! and returns the hash of the super-root node, ready to be referenced from a
//! [`Changeset`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use arbor_types::{Gid, ObjectId};

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, Changeset, EntryType, TreeEntry, TreeNode, ROOT_ENTRY_NAME};
use crate::traits::ObjectStore;

#[derive(Clone, Debug)]
enum Content {
    Dir,
    File(Vec<u8>),
    Symlink(String),
}

#[derive(Clone, Debug)]
struct Pending {
    parent: String,
    name: String,
    content: Content,
    attrs: u32,
}

/// Flat snapshot description keyed by gid.
///
/// ```ignore
/// let root = SnapshotBuilder::new("root")
///     .dir("d1", "root", "dir")
///     .file("f1", "d1", "foo.txt", "hello")
///     .write(&store)?;
/// ```
///
/// Validation (unknown parents, duplicate gids, unreachable cycles) happens in
/// [`SnapshotBuilder::write`].
#[derive(Clone, Debug)]
pub struct SnapshotBuilder {
    root: String,
    root_attrs: u32,
    items: BTreeMap<String, Pending>,
    duplicates: Vec<String>,
}

impl SnapshotBuilder {
    /// Start a snapshot whose top-level directory has gid `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            root_attrs: 0,
            items: BTreeMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Build from nested specs; `children` are the top-level entries.
    pub fn from_specs(root: impl Into<String>, children: &[NodeSpec]) -> Self {
        let root = root.into();
        let mut builder = Self::new(root.clone());
        for spec in children {
            builder = builder.push_spec(&root, spec);
        }
        builder
    }

    fn push_spec(mut self, parent: &str, spec: &NodeSpec) -> Self {
        match spec {
            NodeSpec::Dir {
                gid,
                name,
                attrs,
                children,
            } => {
                self = self.insert(gid, parent, name, Content::Dir, *attrs);
                for child in children {
                    self = self.push_spec(gid, child);
                }
                self
            }
            NodeSpec::File {
                gid,
                name,
                content,
                attrs,
            } => self.insert(gid, parent, name, Content::File(content.as_bytes().to_vec()), *attrs),
            NodeSpec::Symlink {
                gid,
                name,
                target,
                attrs,
            } => self.insert(gid, parent, name, Content::Symlink(target.clone()), *attrs),
        }
    }

    fn insert(mut self, gid: &str, parent: &str, name: &str, content: Content, attrs: u32) -> Self {
        let pending = Pending {
            parent: parent.to_string(),
            name: name.to_string(),
            content,
            attrs,
        };
        if gid == self.root || self.items.insert(gid.to_string(), pending).is_some() {
            self.duplicates.push(gid.to_string());
        }
        self
    }

    pub fn dir(self, gid: &str, parent: &str, name: &str) -> Self {
        self.insert(gid, parent, name, Content::Dir, 0)
    }

    pub fn file(self, gid: &str, parent: &str, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.insert(gid, parent, name, Content::File(content.as_ref().to_vec()), 0)
    }

    pub fn symlink(self, gid: &str, parent: &str, name: &str, target: &str) -> Self {
        self.insert(gid, parent, name, Content::Symlink(target.to_string()), 0)
    }

    /// Set attribute bits on an already added item (or the root).
    pub fn attrs(mut self, gid: &str, attrs: u32) -> Self {
        if gid == self.root {
            self.root_attrs = attrs;
        } else if let Some(item) = self.items.get_mut(gid) {
            item.attrs = attrs;
        }
        self
    }

    /// Write all blobs and tree nodes; returns the super-root hash.
    pub fn write<S: ObjectStore + ?Sized>(&self, store: &S) -> StoreResult<ObjectId> {
        if let Some(dup) = self.duplicates.first() {
            return Err(StoreError::InvalidSnapshot(format!("duplicate gid {dup}")));
        }

        let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (gid, item) in &self.items {
            let parent_is_dir = item.parent == self.root
                || matches!(
                    self.items.get(&item.parent).map(|p| &p.content),
                    Some(Content::Dir)
                );
            if !parent_is_dir {
                return Err(StoreError::InvalidSnapshot(format!(
                    "{gid}: parent {} is not a directory in this snapshot",
                    item.parent
                )));
            }
            children.entry(item.parent.as_str()).or_default().push(gid);
        }

        let mut visited = HashSet::new();
        let root_hid = self.write_dir(store, &self.root, &children, &mut visited)?;
        if visited.len() != self.items.len() {
            return Err(StoreError::InvalidSnapshot(
                "some entries are not reachable from the root".into(),
            ));
        }

        let super_root = TreeNode::new(vec![TreeEntry::new(
            Gid::new(self.root.as_str())?,
            EntryType::Directory,
            ROOT_ENTRY_NAME,
            root_hid,
            self.root_attrs,
        )]);
        let id = store.write(&super_root.to_stored_object()?)?;
        debug!(root = %id.short_hex(), entries = self.items.len(), "wrote snapshot");
        Ok(id)
    }

    fn write_dir<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        dir: &str,
        children: &BTreeMap<&str, Vec<&str>>,
        visited: &mut HashSet<String>,
    ) -> StoreResult<ObjectId> {
        let mut entries = Vec::new();
        for &gid in children.get(dir).map(Vec::as_slice).unwrap_or_default() {
            visited.insert(gid.to_string());
            let item = &self.items[gid];
            let (entry_type, hid) = match &item.content {
                Content::Dir => (
                    EntryType::Directory,
                    self.write_dir(store, gid, children, visited)?,
                ),
                Content::File(data) => (
                    EntryType::File,
                    store.write(&Blob::new(data.clone()).to_stored_object())?,
                ),
                Content::Symlink(target) => (
                    EntryType::Symlink,
                    store.write(&Blob::new(target.as_bytes()).to_stored_object())?,
                ),
            };
            entries.push(TreeEntry::new(
                Gid::new(gid)?,
                entry_type,
                item.name.clone(),
                hid,
                item.attrs,
            ));
        }
        store.write(&TreeNode::new(entries).to_stored_object()?)
    }
}

/// Nested snapshot description, as found in repository manifests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSpec {
    Dir {
        gid: String,
        name: String,
        #[serde(default)]
        attrs: u32,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    File {
        gid: String,
        name: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        attrs: u32,
    },
    Symlink {
        gid: String,
        name: String,
        target: String,
        #[serde(default)]
        attrs: u32,
    },
}

/// Store a changeset object and return its id.
pub fn write_changeset<S: ObjectStore + ?Sized>(
    store: &S,
    changeset: &Changeset,
) -> StoreResult<ObjectId> {
    store.write(&changeset.to_stored_object()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectStore;

    fn load_node(store: &InMemoryObjectStore, id: &ObjectId) -> TreeNode {
        TreeNode::from_stored_object(&store.read_required(id).unwrap()).unwrap()
    }

    #[test]
    fn writes_super_root_with_single_entry() {
        let store = InMemoryObjectStore::new();
        let id = SnapshotBuilder::new("root")
            .dir("d1", "root", "dir")
            .file("f1", "d1", "foo.txt", "hello")
            .write(&store)
            .unwrap();

        let super_root = load_node(&store, &id);
        assert_eq!(super_root.len(), 1);
        let root = &super_root.entries[0];
        assert_eq!(root.name, ROOT_ENTRY_NAME);
        assert!(root.is_directory());

        let top = load_node(&store, &root.hid);
        let dir = top.find_by_name("dir").unwrap();
        let inner = load_node(&store, &dir.hid);
        assert_eq!(inner.entries[0].name, "foo.txt");
        assert_eq!(inner.entries[0].entry_type, EntryType::File);
    }

    #[test]
    fn identical_descriptions_share_hashes() {
        let store = InMemoryObjectStore::new();
        let build = || {
            SnapshotBuilder::new("root")
                .file("f1", "root", "a", "x")
                .write(&store)
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn rejects_duplicate_gid() {
        let store = InMemoryObjectStore::new();
        let err = SnapshotBuilder::new("root")
            .file("f1", "root", "a", "x")
            .file("f1", "root", "b", "y")
            .write(&store)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSnapshot(msg) if msg.contains("f1")));
    }

    #[test]
    fn rejects_file_parent() {
        let store = InMemoryObjectStore::new();
        let err = SnapshotBuilder::new("root")
            .file("f1", "root", "a", "x")
            .file("f2", "f1", "b", "y")
            .write(&store)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSnapshot(_)));
    }

    #[test]
    fn rejects_cycle() {
        let store = InMemoryObjectStore::new();
        let err = SnapshotBuilder::new("root")
            .dir("d1", "d2", "a")
            .dir("d2", "d1", "b")
            .write(&store)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSnapshot(_)));
    }

    #[test]
    fn nested_specs_match_flat_builder() {
        let store = InMemoryObjectStore::new();
        let specs = vec![NodeSpec::Dir {
            gid: "d1".into(),
            name: "dir".into(),
            attrs: 0,
            children: vec![
                NodeSpec::File {
                    gid: "f1".into(),
                    name: "foo.txt".into(),
                    content: "hello".into(),
                    attrs: 1,
                },
                NodeSpec::Symlink {
                    gid: "l1".into(),
                    name: "link".into(),
                    target: "foo.txt".into(),
                    attrs: 0,
                },
            ],
        }];
        let nested = SnapshotBuilder::from_specs("root", &specs)
            .write(&store)
            .unwrap();
        let flat = SnapshotBuilder::new("root")
            .dir("d1", "root", "dir")
            .file("f1", "d1", "foo.txt", "hello")
            .attrs("f1", 1)
            .symlink("l1", "d1", "link", "foo.txt")
            .write(&store)
            .unwrap();
        assert_eq!(nested, flat);
    }

    #[test]
    fn node_spec_parses_from_json() {
        let spec: NodeSpec = serde_json::from_str(
            r#"{"type": "file", "gid": "f1", "name": "a.txt", "content": "hi"}"#,
        )
        .unwrap();
        assert!(matches!(spec, NodeSpec::File { attrs: 0, .. }));
    }
}
