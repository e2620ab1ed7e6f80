use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use arbor_types::{Gid, ObjectId};

use crate::error::{StoreError, StoreResult};

/// Name of the single entry inside a changeset's super-root tree node.
pub const ROOT_ENTRY_NAME: &str = "@";

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// File contents or a symlink target.
    Blob,
    /// One directory listing.
    TreeNode,
    /// A committed snapshot: root tree node plus parents.
    Changeset,
}

impl ObjectKind {
    /// Domain tag mixed into the content hash so that identical bytes of
    /// different kinds never share an id.
    pub fn domain(&self) -> &'static str {
        match self {
            Self::Blob => "arbor-blob-v1",
            Self::TreeNode => "arbor-treenode-v1",
            Self::Changeset => "arbor-changeset-v1",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::TreeNode => write!(f, "treenode"),
            Self::Changeset => write!(f, "changeset"),
        }
    }
}

/// A stored object: kind tag plus opaque bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Content-addressed id of this object.
    pub fn compute_id(&self) -> ObjectId {
        ObjectId::hash_with_domain(self.kind.domain(), &self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }
}

fn encode<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<StoredObject> {
    let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(StoredObject::new(kind, data))
}

fn decode<T: DeserializeOwned>(kind: ObjectKind, obj: &StoredObject) -> StoreResult<T> {
    obj.expect_kind(kind)?;
    serde_json::from_slice(&obj.data).map_err(|e| StoreError::CorruptObject {
        id: obj.compute_id(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// TreeNode
// ---------------------------------------------------------------------------

/// What a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a directory listing.
///
/// The `name` is the object's name inside this particular parent in this
/// particular snapshot; the `gid` is what identifies the object across
/// snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub gid: Gid,
    pub entry_type: EntryType,
    pub name: String,
    /// Blob hash for files and symlinks, child tree node hash for
    /// directories.
    pub hid: ObjectId,
    /// Attribute bits (e.g. executable).
    #[serde(default)]
    pub attrs: u32,
}

impl TreeEntry {
    pub fn new(
        gid: Gid,
        entry_type: EntryType,
        name: impl Into<String>,
        hid: ObjectId,
        attrs: u32,
    ) -> Self {
        Self {
            gid,
            entry_type,
            name: name.into(),
            hid,
            attrs,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

/// A directory listing, entries ordered by gid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub entries: Vec<TreeEntry>,
}

impl TreeNode {
    /// Build a node; entries are sorted by gid so that equal listings hash
    /// equally.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.gid.cmp(&b.gid));
        Self { entries }
    }

    /// Look up an entry by gid.
    pub fn get(&self, gid: &Gid) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.gid.cmp(gid))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Look up an entry by its name in this directory.
    pub fn find_by_name(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::TreeNode, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(ObjectKind::TreeNode, obj)
    }
}

// ---------------------------------------------------------------------------
// Changeset
// ---------------------------------------------------------------------------

/// An immutable snapshot of the whole tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// Hash of the super-root tree node.
    pub root: ObjectId,
    /// Parent changesets (two for a merge).
    pub parents: Vec<ObjectId>,
    /// One more than the largest parent generation; 1 for a root commit.
    pub generation: u64,
    #[serde(default)]
    pub message: String,
}

impl Changeset {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Changeset, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(ObjectKind::Changeset, obj)
    }
}
