//! Foundation types for arbor.
//!
//! Every other arbor crate depends on `arbor-types`. Two identifiers matter
//! to the comparison engine:
//!
//! - [`ObjectId`] — content hash (BLAKE3) of a blob, tree node or changeset.
//!   Equal ids imply byte-identical content.
//! - [`Gid`] — path-independent identifier assigned to a versioned file or
//!   directory when it is created. It survives renames and moves.

pub mod error;
pub mod gid;
pub mod object;

pub use error::TypeError;
pub use gid::Gid;
pub use object::ObjectId;
