use serde::{Deserialize, Serialize};

use arbor_store::SnapshotBuilder;
use arbor_types::ObjectId;

/// A snapshot to commit, with its parents.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub tree: SnapshotBuilder,
    pub parents: Vec<ObjectId>,
    pub message: String,
    /// Name to register the new changeset under.
    pub name: Option<String>,
}

impl CommitRequest {
    pub fn new(tree: SnapshotBuilder) -> Self {
        Self {
            tree,
            parents: Vec::new(),
            message: String::new(),
            name: None,
        }
    }

    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Message stored in the changeset; the name stands in when no message
    /// was given so that equal trees with equal parents stay distinct.
    pub fn effective_message(&self) -> &str {
        match (&self.name, self.message.is_empty()) {
            (Some(name), true) => name,
            _ => &self.message,
        }
    }
}

/// One committed changeset, for listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangesetSummary {
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub generation: u64,
    pub parents: Vec<ObjectId>,
    pub message: String,
}
