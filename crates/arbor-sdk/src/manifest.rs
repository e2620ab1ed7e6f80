//! Repository manifests.
//!
//! A manifest lists named changesets in commit order, each with its parents
//! (by name) and its tree as nested [`NodeSpec`]s, plus optional `[diff]`
//! and `[mstatus]` sections overriding the comparison defaults.
//!
//! ```toml
//! [diff]
//! sort = true
//!
//! [[changeset]]
//! name = "base"
//! tree = [
//!   { type = "dir", gid = "d1", name = "dir", children = [
//!     { type = "file", gid = "f1", name = "foo.txt", content = "hello" },
//!   ] },
//! ]
//!
//! [[changeset]]
//! name = "renamed"
//! parents = ["base"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use arbor_diff::DiffOptions;
use arbor_merge::MstatusOptions;
use arbor_store::{NodeSpec, SnapshotBuilder};

use crate::commit::CommitRequest;
use crate::error::{SdkError, SdkResult};
use crate::repository::Arbor;

fn default_root() -> String {
    "root".into()
}

/// One changeset in a manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangesetSpec {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub message: String,
    /// Gid of the top-level directory.
    #[serde(default = "default_root")]
    pub root: String,
    /// Top-level entries.
    #[serde(default)]
    pub tree: Vec<NodeSpec>,
}

impl ChangesetSpec {
    pub fn snapshot(&self) -> SnapshotBuilder {
        SnapshotBuilder::from_specs(self.root.clone(), &self.tree)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub diff: DiffOptions,
    #[serde(default)]
    pub mstatus: MstatusOptions,
    #[serde(default, rename = "changeset")]
    pub changesets: Vec<ChangesetSpec>,
}

impl Manifest {
    /// Load a manifest; `.json` files are read as JSON, anything else as
    /// TOML.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let manifest = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        debug!(
            path = %path.display(),
            changesets = manifest.changesets.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Manifest(e.to_string()))
    }

    pub fn from_json_str(text: &str) -> SdkResult<Self> {
        serde_json::from_str(text).map_err(|e| SdkError::Manifest(e.to_string()))
    }

    /// Commit every changeset into a fresh repository, in manifest order.
    /// Parents must appear before their children.
    pub fn build(&self) -> SdkResult<Arbor> {
        let mut arbor = Arbor::init();
        for spec in &self.changesets {
            let mut request = CommitRequest::new(spec.snapshot())
                .with_message(spec.message.clone())
                .with_name(spec.name.clone());
            for parent in &spec.parents {
                let id = arbor
                    .resolve(parent)
                    .map_err(|_| SdkError::UnknownChangeset(parent.clone()))?;
                request = request.with_parent(id);
            }
            arbor.commit(request)?;
        }
        Ok(arbor)
    }
}
