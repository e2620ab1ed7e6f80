//! Historical paths, resolved through the object table.
//!
//! A path is rebuilt from parent links on one side, so it is the object's
//! path as of that changeset: `@0/dir/foo.txt`, `@1/dir/`. The root
//! directory is `@<domain>/`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use arbor_types::Gid;

use crate::error::{DiffError, DiffResult};
use crate::table::{ObjectTable, Side};

/// Memoized `(gid, side) -> path` lookups over a finished table.
///
/// Snapshots never change during a comparison, so a path computed once is
/// valid for the rest of the session.
pub struct PathResolver<'t> {
    table: &'t ObjectTable,
    domains: [char; 2],
    memo: RefCell<HashMap<(Gid, Side), Option<String>>>,
    computed: Cell<usize>,
}

impl<'t> PathResolver<'t> {
    pub fn new(table: &'t ObjectTable, domains: [char; 2]) -> Self {
        Self {
            table,
            domains,
            memo: RefCell::new(HashMap::new()),
            computed: Cell::new(0),
        }
    }

    /// Path prefix of the root directory on `side`.
    pub fn root_path(&self, side: Side) -> String {
        format!("@{}/", self.domains[side.index()])
    }

    /// Path of `gid` on `side`, or `None` if it has no instance there.
    pub fn resolve(&self, gid: &Gid, side: Side) -> DiffResult<Option<String>> {
        let key = (gid.clone(), side);
        if let Some(hit) = self.memo.borrow().get(&key) {
            return Ok(hit.clone());
        }

        let path = self.compute(gid, side)?;
        self.computed.set(self.computed.get() + 1);
        self.memo.borrow_mut().insert(key, path.clone());
        Ok(path)
    }

    fn compute(&self, gid: &Gid, side: Side) -> DiffResult<Option<String>> {
        let Some(instance) = self.table.get(gid).and_then(|r| r.instance(side)) else {
            return Ok(None);
        };
        let Some(parent) = &instance.parent else {
            return Ok(Some(self.root_path(side)));
        };
        let Some(mut path) = self.resolve(parent, side)? else {
            return Err(DiffError::MissingParent {
                gid: gid.clone(),
                parent: parent.clone(),
                side,
            });
        };
        path.push_str(&instance.entry.name);
        if instance.entry.is_directory() {
            path.push('/');
        }
        Ok(Some(path))
    }

    /// Number of paths computed rather than served from the memo.
    pub fn computed(&self) -> usize {
        self.computed.get()
    }
}
