use arbor_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// Implementations must keep objects immutable once written and propagate
/// I/O failures instead of hiding them. Reads may happen from several
/// comparison sessions at once.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id. `Ok(None)` means the object is absent.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its id. Writing an existing object is a
    /// no-op.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read an object that must be present, mapping absence to
    /// [`StoreError::NotFound`].
    fn read_required(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }
}
