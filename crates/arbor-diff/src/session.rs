//! Comparison sessions.
//!
//! A [`DiffSession`] borrows a repository and owns the tree node cache. One
//! session can run any number of comparisons; each gets a fresh
//! [`ObjectTable`], while decoded tree nodes are reused across them.

use tracing::debug;

use arbor_types::ObjectId;

use crate::cache::{CacheStats, TreeNodeCache};
use crate::closure::{compute_closure, populate_super_root, WorkQueue};
use crate::config::DiffOptions;
use crate::error::{DiffError, DiffResult};
use crate::flags::compute_flags;
use crate::paths::PathResolver;
use crate::repo::RepoView;
use crate::status::{sort_by_path, ChangeRecord, Comparison};
use crate::table::{ObjectTable, Side};

pub struct DiffSession<'r, R: RepoView + ?Sized> {
    repo: &'r R,
    cache: TreeNodeCache,
}

impl<'r, R: RepoView + ?Sized> DiffSession<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self {
            repo,
            cache: TreeNodeCache::new(),
        }
    }

    pub fn repo(&self) -> &'r R {
        self.repo
    }

    pub fn cache(&self) -> &TreeNodeCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut TreeNodeCache {
        &mut self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Changed objects between two changesets.
    pub fn diff(
        &mut self,
        orig: &ObjectId,
        dest: &ObjectId,
        opts: &DiffOptions,
    ) -> DiffResult<Vec<ChangeRecord>> {
        Ok(self.compare(orig, dest, opts)?.records)
    }

    /// Like [`DiffSession::diff`], also returning the object table and
    /// closure counters.
    pub fn compare(
        &mut self,
        orig: &ObjectId,
        dest: &ObjectId,
        opts: &DiffOptions,
    ) -> DiffResult<Comparison> {
        if orig == dest {
            return Err(DiffError::SameChangeset(*orig));
        }
        opts.validate()?;

        let roots = [
            self.repo.resolve_root_hash(orig)?,
            self.repo.resolve_root_hash(dest)?,
        ];
        let mut table = ObjectTable::new();
        let mut queue = WorkQueue::new();
        for side in Side::BOTH {
            populate_super_root(
                &mut table,
                &mut queue,
                &mut self.cache,
                self.repo,
                side,
                &roots[side.index()],
            )?;
        }
        let stats = compute_closure(&mut table, &mut queue, &mut self.cache, self.repo)?;

        let paths = PathResolver::new(&table, opts.domains);
        let mut records = Vec::new();
        for record in table.iter() {
            let orig_version = record.version(Side::Orig);
            let dest_version = record.version(Side::Dest);
            let flags = compute_flags(orig_version, dest_version)?;
            if !flags.is_changed() {
                continue;
            }
            let orig_path = paths.resolve(&record.gid, Side::Orig)?;
            let dest_path = paths.resolve(&record.gid, Side::Dest)?;
            records.push(ChangeRecord::build(
                self.repo,
                record.gid.clone(),
                flags,
                [orig_path.zip(orig_version), dest_path.zip(dest_version)],
                opts,
            )?);
        }
        if opts.sort {
            sort_by_path(&mut records);
        }

        debug!(
            orig = %orig.short_hex(),
            dest = %dest.short_hex(),
            objects = table.len(),
            changed = records.len(),
            paths = paths.computed(),
            cache_misses = self.cache.stats().misses,
            "comparison complete"
        );
        Ok(Comparison {
            records,
            table,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::StatusFlags;
    use crate::repo::StoreRepo;
    use arbor_store::{
        write_changeset, Changeset, InMemoryObjectStore, SnapshotBuilder, StoreError,
    };
    use arbor_types::Gid;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    type Repo = StoreRepo<InMemoryObjectStore>;

    fn commit(repo: &Repo, builder: SnapshotBuilder) -> ObjectId {
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

    fn rename_pair(repo: &Repo) -> (ObjectId, ObjectId) {
        let before = commit(
            repo,
            SnapshotBuilder::new("root")
                .dir("d1", "root", "dir")
                .file("f1", "d1", "foo.txt", "hello")
                .file("f2", "d1", "keep.txt", "same")
                .dir("d2", "root", "other")
                .file("f3", "d2", "x", "x"),
        );
        let after = commit(
            repo,
            SnapshotBuilder::new("root")
                .dir("d1", "root", "dir")
                .file("f1", "d1", "bar.txt", "hello")
                .file("f2", "d1", "keep.txt", "same")
                .dir("d2", "root", "other")
                .file("f3", "d2", "x", "x"),
        );
        (before, after)
    }

    #[test]
    fn comparing_with_itself_is_rejected() {
        let repo = Repo::new(InMemoryObjectStore::new());
        let (a, _) = rename_pair(&repo);
        let mut session = DiffSession::new(&repo);
        let err = session.diff(&a, &a, &DiffOptions::default()).unwrap_err();
        assert!(matches!(err, DiffError::SameChangeset(id) if id == a));
    }

    #[test]
    fn rename_inside_unchanged_directory() {
        let repo = Repo::new(InMemoryObjectStore::new());
        let (before, after) = rename_pair(&repo);
        let mut session = DiffSession::new(&repo);
        let cmp = session
            .compare(&before, &after, &DiffOptions::default())
            .unwrap();

        assert_eq!(cmp.records.len(), 1);
        let rec = &cmp.records[0];
        assert_eq!(rec.gid.as_str(), "f1");
        assert!(rec.flags.contains(StatusFlags::RENAMED));
        assert!(!rec.flags.contains(StatusFlags::MOVED));
        assert!(!rec.flags.contains(StatusFlags::MULTIPLE_CHANGE));
        assert_eq!(rec.sides[0].path, "@0/dir/foo.txt");
        assert_eq!(rec.sides[1].path, "@1/dir/bar.txt");
        assert_eq!(rec.path, "@1/dir/bar.txt");

        // dir was expanded (its listing changed) but is not reported.
        let dir = cmp.table.get(&Gid::new("d1").unwrap()).unwrap();
        assert_ne!(
            dir.instance(Side::Orig).unwrap().entry.hid,
            dir.instance(Side::Dest).unwrap().entry.hid
        );
        // other/ was short-circuited: its child never entered the table.
        assert!(cmp.table.get(&Gid::new("f3").unwrap()).is_none());
        assert_eq!(cmp.stats.short_circuited, 1);
    }

    #[test]
    fn unchanged_subtree_is_never_loaded() {
        let repo = Repo::new(InMemoryObjectStore::new());
        let (before, after) = rename_pair(&repo);
        let mut session = DiffSession::new(&repo);
        let cmp = session
            .compare(&before, &after, &DiffOptions::default())
            .unwrap();
        let other = cmp.table.get(&Gid::new("d2").unwrap()).unwrap();
        let hid = other.instance(Side::Dest).unwrap().entry.hid;
        assert!(!session.cache().contains(&hid));

        // A second comparison in the same session reuses decoded nodes.
        let misses = session.cache_stats().misses;
        session
            .diff(&after, &before, &DiffOptions::default())
            .unwrap();
        assert_eq!(session.cache_stats().misses, misses);
        assert!(session.cache_stats().hits > 0);
    }

    #[test]
    fn adds_deletes_moves_and_attribute_changes() {
        let repo = Repo::new(InMemoryObjectStore::new());
        let before = commit(
            &repo,
            SnapshotBuilder::new("root")
                .dir("src", "root", "src")
                .file("a", "src", "a.rs", "a")
                .file("b", "root", "b.rs", "b")
                .file("gone", "root", "old.txt", "old")
                .symlink("ln", "root", "link", "src/a.rs"),
        );
        let after = commit(
            &repo,
            SnapshotBuilder::new("root")
                .dir("src", "root", "src")
                .file("a", "src", "a.rs", "a2")
                .file("b", "src", "b.rs", "b")
                .file("new", "root", "new.txt", "new")
                .symlink("ln", "root", "link", "src/a.rs")
                .attrs("ln", 0o755),
        );
        let mut session = DiffSession::new(&repo);
        let records = session
            .diff(&before, &after, &DiffOptions::default())
            .unwrap();
        let by_gid: BTreeMap<_, _> = records
            .iter()
            .map(|r| (r.gid.as_str().to_string(), r))
            .collect();

        assert_eq!(by_gid.len(), 5);
        assert!(by_gid["a"].flags.contains(StatusFlags::NON_DIR_MODIFIED));
        assert!(by_gid["b"].flags.contains(StatusFlags::MOVED));
        assert_eq!(by_gid["b"].path, "@1/src/b.rs");
        assert!(by_gid["gone"].flags.contains(StatusFlags::DELETED));
        assert_eq!(by_gid["gone"].path, "@0/old.txt");
        assert_eq!(by_gid["gone"].sides.len(), 1);
        assert!(by_gid["new"].flags.contains(StatusFlags::ADDED));
        let ln = by_gid["ln"];
        assert!(ln.flags.contains(StatusFlags::ATTR_CHANGED));
        assert_eq!(
            ln.sides[1].symlink_target.as_ref().and_then(|t| t.as_str()),
            Some("src/a.rs")
        );
        assert_eq!(ln.sides[1].attrs, 0o755);

        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn sparse_repository_fails_with_not_found() {
        let repo = Repo::new(InMemoryObjectStore::new());
        let (before, after) = rename_pair(&repo);
        let d1 = repo
            .resolve_gid_to_entry(&Gid::new("d1").unwrap(), &after)
            .unwrap()
            .unwrap();
        assert!(repo.store().remove(&d1.entry.hid));

        let mut session = DiffSession::new(&repo);
        let err = session
            .diff(&before, &after, &DiffOptions::default())
            .unwrap_err();
        assert!(matches!(err, DiffError::Store(StoreError::NotFound(id)) if id == d1.entry.hid));
    }

    #[test]
    fn custom_domains_label_the_sides() {
        let repo = Repo::new(InMemoryObjectStore::new());
        let (before, after) = rename_pair(&repo);
        let mut session = DiffSession::new(&repo);
        let records = session
            .diff(&before, &after, &DiffOptions::with_domains('B', 'M'))
            .unwrap();
        assert_eq!(records[0].sides[0].path, "@B/dir/foo.txt");
        assert_eq!(records[0].sides[1].label, "M");
        assert!(records[0].side('M').is_some());
    }

    #[test]
    fn independent_sessions_share_one_repo_across_threads() {
        let repo = Repo::new(InMemoryObjectStore::new());
        let (before, after) = rename_pair(&repo);
        let results: Vec<Vec<ChangeRecord>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        DiffSession::new(&repo)
                            .diff(&before, &after, &DiffOptions::default())
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(results[0].len(), 1);
    }

    /// A small random tree, one `(parent, is_dir, name, content)` per item.
    /// `parent` picks an earlier directory or the root.
    fn arb_tree() -> impl Strategy<Value = Vec<(usize, bool, u8, u8)>> {
        prop::collection::vec((any::<usize>(), any::<bool>(), 0u8..4, 0u8..3), 0..12)
    }

    fn build_tree(shape: &[(usize, bool, u8, u8)]) -> SnapshotBuilder {
        let mut builder = SnapshotBuilder::new("root");
        let mut dirs = vec!["root".to_string()];
        for (i, (parent, is_dir, name, content)) in shape.iter().enumerate() {
            let gid = format!("g{i}");
            let parent = dirs[parent % dirs.len()].clone();
            // gid in the name keeps sibling names unique.
            let name = format!("n{name}-{i}");
            if *is_dir {
                builder = builder.dir(&gid, &parent, &name);
                dirs.push(gid);
            } else {
                builder = builder.file(&gid, &parent, &name, [*content]);
            }
        }
        builder
    }

    proptest! {
        #[test]
        fn diff_is_symmetric(
            left in arb_tree(),
            right in arb_tree(),
        ) {
            let repo = Repo::new(InMemoryObjectStore::new());
            // Type changes across sides are an error; keep kinds aligned.
            let right: Vec<_> = right
                .into_iter()
                .enumerate()
                .map(|(i, (p, is_dir, n, c))| match left.get(i) {
                    Some((_, d, _, _)) => (p, *d, n, c),
                    None => (p, is_dir, n, c),
                })
                .collect();
            let a = commit(&repo, build_tree(&left));
            let b = commit(&repo, build_tree(&right));
            prop_assume!(a != b);

            let mut session = DiffSession::new(&repo);
            let forward = session.diff(&a, &b, &DiffOptions::default()).unwrap();
            let backward = session.diff(&b, &a, &DiffOptions::default()).unwrap();

            let index = |records: &[ChangeRecord]| -> BTreeMap<Gid, StatusFlags> {
                records.iter().map(|r| (r.gid.clone(), r.flags)).collect()
            };
            let forward = index(&forward);
            let backward = index(&backward);
            prop_assert_eq!(forward.len(), backward.len());

            let swap = StatusFlags::ADDED | StatusFlags::DELETED;
            for (gid, flags) in &forward {
                let back = backward.get(gid).copied();
                prop_assert!(back.is_some(), "{} missing from reverse diff", gid);
                let back = back.unwrap_or_default();
                prop_assert_eq!(flags.difference(swap), back.difference(swap));
                prop_assert_eq!(
                    flags.contains(StatusFlags::ADDED),
                    back.contains(StatusFlags::DELETED)
                );
                prop_assert_eq!(
                    flags.contains(StatusFlags::DELETED),
                    back.contains(StatusFlags::ADDED)
                );
            }
        }
    }
}
