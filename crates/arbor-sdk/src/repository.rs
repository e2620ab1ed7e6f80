use std::collections::BTreeMap;

use tracing::debug;

use arbor_dag::{ChangesetDag, DagNode};
use arbor_diff::{ChangeRecord, DiffOptions, DiffSession, FilterOptions, StoreRepo};
use arbor_merge::{mstatus, MergeStatus, MstatusOptions};
use arbor_store::{write_changeset, Changeset, InMemoryObjectStore};
use arbor_types::ObjectId;

use crate::commit::{ChangesetSummary, CommitRequest};
use crate::error::{SdkError, SdkResult};

/// Repository view used by every comparison.
pub type Repo = StoreRepo<InMemoryObjectStore>;

/// Shortest hex prefix accepted by [`Arbor::resolve`].
pub const MIN_PREFIX_LEN: usize = 4;

/// High-level arbor repository API.
pub struct Arbor {
    repo: Repo,
    dag: ChangesetDag,
    names: BTreeMap<String, ObjectId>,
}

impl Arbor {
    /// An empty in-memory repository.
    pub fn init() -> Self {
        Self {
            repo: Repo::new(InMemoryObjectStore::new()),
            dag: ChangesetDag::new(),
            names: BTreeMap::new(),
        }
    }

    // ---- History ----

    /// Write the request's tree and commit it on top of its parents.
    pub fn commit(&mut self, request: CommitRequest) -> SdkResult<ObjectId> {
        if let Some(name) = &request.name {
            if self.names.contains_key(name) {
                return Err(SdkError::DuplicateName(name.clone()));
            }
        }
        let mut generation = 1;
        for parent in &request.parents {
            let node = self
                .dag
                .get_node(parent)
                .ok_or_else(|| SdkError::UnknownChangeset(parent.to_hex()))?;
            generation = generation.max(node.generation + 1);
        }

        let root = request.tree.write(self.repo.store())?;
        let changeset = Changeset {
            root,
            parents: request.parents.clone(),
            generation,
            message: request.effective_message().to_string(),
        };
        let id = write_changeset(self.repo.store(), &changeset)?;
        self.dag
            .add_node(DagNode::new(id, generation, request.parents))?;
        debug!(
            id = %id.short_hex(),
            generation,
            name = request.name.as_deref().unwrap_or(""),
            "committed changeset"
        );
        if let Some(name) = request.name {
            self.names.insert(name, id);
        }
        Ok(id)
    }

    /// Look up a changeset by name, full id or unique id prefix.
    pub fn resolve(&self, rev: &str) -> SdkResult<ObjectId> {
        if let Some(id) = self.names.get(rev) {
            return Ok(*id);
        }
        let prefix = rev.to_ascii_lowercase();
        if prefix.len() < MIN_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SdkError::UnknownChangeset(rev.into()));
        }
        let matches: Vec<ObjectId> = self
            .dag
            .nodes()
            .map(|n| n.id)
            .filter(|id| id.to_hex().starts_with(&prefix))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(SdkError::UnknownChangeset(rev.into())),
            _ => Err(SdkError::AmbiguousChangeset {
                prefix: rev.into(),
                count: matches.len(),
            }),
        }
    }

    pub fn name_of(&self, id: &ObjectId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, named)| *named == id)
            .map(|(name, _)| name.as_str())
    }

    /// Every changeset, oldest generation first.
    pub fn changesets(&self) -> SdkResult<Vec<ChangesetSummary>> {
        let mut out = Vec::with_capacity(self.dag.len());
        for node in self.dag.nodes() {
            let changeset = self.repo.load_changeset(&node.id)?;
            out.push(ChangesetSummary {
                id: node.id,
                name: self.name_of(&node.id).map(str::to_string),
                generation: node.generation,
                parents: node.parents.clone(),
                message: changeset.message,
            });
        }
        out.sort_by(|a, b| a.generation.cmp(&b.generation).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    // ---- Comparisons ----

    /// A session for running several comparisons over one cache.
    pub fn session(&self) -> DiffSession<'_, Repo> {
        DiffSession::new(&self.repo)
    }

    pub fn status(
        &self,
        orig: &ObjectId,
        dest: &ObjectId,
        opts: &DiffOptions,
    ) -> SdkResult<Vec<ChangeRecord>> {
        Ok(self.session().diff(orig, dest, opts)?)
    }

    pub fn status_filtered(
        &self,
        orig: &ObjectId,
        dest: &ObjectId,
        filter: &FilterOptions,
        opts: &DiffOptions,
    ) -> SdkResult<Vec<ChangeRecord>> {
        Ok(self.session().diff_filtered(orig, dest, filter, opts)?)
    }

    pub fn mstatus(&self, merge: &ObjectId, opts: &MstatusOptions) -> SdkResult<MergeStatus> {
        let mut session = self.session();
        Ok(mstatus(&mut session, &self.dag, merge, opts)?)
    }

    // ---- Accessors ----

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    pub fn dag(&self) -> &ChangesetDag {
        &self.dag
    }

    pub fn store(&self) -> &InMemoryObjectStore {
        self.repo.store()
    }
}

impl Default for Arbor {
    fn default() -> Self {
        Self::init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_diff::{StatusFlags, StatusInput};
    use arbor_merge::{Existence, MergeChanges};
    use arbor_store::SnapshotBuilder;

    fn base() -> SnapshotBuilder {
        SnapshotBuilder::new("root")
            .dir("d", "root", "dir")
            .file("f", "d", "foo.txt", "hello")
    }

    fn renamed() -> SnapshotBuilder {
        SnapshotBuilder::new("root")
            .dir("d", "root", "dir")
            .file("f", "d", "bar.txt", "hello")
    }

    /// base -> left -> merge
    ///     \-> right -/
    fn diamond(arbor: &mut Arbor) -> [ObjectId; 4] {
        let a = arbor
            .commit(CommitRequest::new(base()).with_name("base"))
            .unwrap();
        let b = arbor
            .commit(CommitRequest::new(renamed()).with_parent(a).with_name("left"))
            .unwrap();
        let c = arbor
            .commit(
                CommitRequest::new(base().file("n", "d", "new.txt", "n"))
                    .with_parent(a)
                    .with_name("right"),
            )
            .unwrap();
        let m = arbor
            .commit(
                CommitRequest::new(renamed().file("n", "d", "new.txt", "n"))
                    .with_parent(b)
                    .with_parent(c)
                    .with_name("merge"),
            )
            .unwrap();
        [a, b, c, m]
    }

    #[test]
    fn commit_tracks_generations() {
        let mut arbor = Arbor::init();
        let [a, b, _, m] = diamond(&mut arbor);
        assert_eq!(arbor.dag().len(), 4);
        assert_eq!(arbor.dag().get_node(&a).unwrap().generation, 1);
        assert_eq!(arbor.dag().get_node(&b).unwrap().generation, 2);
        assert_eq!(arbor.dag().get_node(&m).unwrap().generation, 3);

        let log = arbor.changesets().unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].name.as_deref(), Some("base"));
        assert_eq!(log[3].name.as_deref(), Some("merge"));
        assert_eq!(log[3].parents.len(), 2);
    }

    #[test]
    fn commit_rejects_unknown_parent_and_reused_name() {
        let mut arbor = Arbor::init();
        let stray = ObjectId::from_hash([9; 32]);
        let err = arbor
            .commit(CommitRequest::new(base()).with_parent(stray))
            .unwrap_err();
        assert!(matches!(err, SdkError::UnknownChangeset(_)));

        arbor
            .commit(CommitRequest::new(base()).with_name("x"))
            .unwrap();
        let err = arbor
            .commit(CommitRequest::new(renamed()).with_name("x"))
            .unwrap_err();
        assert!(matches!(err, SdkError::DuplicateName(name) if name == "x"));
    }

    #[test]
    fn identical_commit_is_a_duplicate() {
        let mut arbor = Arbor::init();
        arbor
            .commit(CommitRequest::new(base()).with_message("same"))
            .unwrap();
        let err = arbor
            .commit(CommitRequest::new(base()).with_message("same"))
            .unwrap_err();
        assert!(matches!(err, SdkError::Dag(_)));
    }

    #[test]
    fn resolve_by_name_id_and_prefix() {
        let mut arbor = Arbor::init();
        let [a, ..] = diamond(&mut arbor);
        assert_eq!(arbor.resolve("base").unwrap(), a);
        assert_eq!(arbor.resolve(&a.to_hex()).unwrap(), a);
        assert_eq!(arbor.resolve(&a.to_hex()[..12].to_uppercase()).unwrap(), a);
        assert_eq!(arbor.name_of(&a), Some("base"));
        assert!(matches!(
            arbor.resolve("abc"),
            Err(SdkError::UnknownChangeset(_))
        ));
        assert!(matches!(
            arbor.resolve("nope"),
            Err(SdkError::UnknownChangeset(_))
        ));
    }

    #[test]
    fn status_reports_rename() {
        let mut arbor = Arbor::init();
        let [a, b, ..] = diamond(&mut arbor);
        let records = arbor.status(&a, &b, &DiffOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].flags.contains(StatusFlags::RENAMED));
        assert_eq!(records[0].path, "@1/dir/bar.txt");
    }

    #[test]
    fn filtered_status_by_gid() {
        let mut arbor = Arbor::init();
        let [a, _, _, m] = diamond(&mut arbor);
        let filter = FilterOptions {
            inputs: vec![StatusInput::Gid("n".parse().unwrap())],
            depth: None,
        };
        let records = arbor
            .status_filtered(&a, &m, &filter, &DiffOptions::default())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].status.added);
    }

    #[test]
    fn mstatus_over_diamond() {
        let mut arbor = Arbor::init();
        let [a, _, _, m] = diamond(&mut arbor);
        let status = arbor.mstatus(&m, &MstatusOptions::default()).unwrap();
        assert_eq!(status.legend.get(arbor_merge::Label::A), Some(&a));
        let MergeChanges::Diamond(records) = status.changes else {
            panic!("expected a diamond");
        };
        let existence: Vec<_> = records.iter().map(|r| r.existence).collect();
        assert_eq!(existence, [Existence::ABCM, Existence::CM]);
        assert_eq!(records[0].headings, ["Renamed (M==B, M!=C)"]);
    }
}
