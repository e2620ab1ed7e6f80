use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable, path-independent identifier of a versioned object.
///
/// A `Gid` is assigned once when a file, directory or symlink is first added
/// and never changes afterwards, no matter how often the object is renamed or
/// moved. All tree comparison is keyed on it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gid(String);

impl Gid {
    /// Allocate a fresh gid (`g` followed by a UUIDv7 in simple form).
    ///
    /// UUIDv7 sorts by creation time, so freshly generated gids order
    /// roughly by age.
    pub fn generate() -> Self {
        Self(format!("g{}", uuid::Uuid::now_v7().simple()))
    }

    /// Wrap an existing identifier. Must be non-empty and free of `/`.
    pub fn new(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        if s.is_empty() {
            return Err(TypeError::InvalidGid(s, "empty"));
        }
        if s.contains('/') {
            return Err(TypeError::InvalidGid(s, "contains '/'"));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gid({})", self.0)
    }
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Gid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Gid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Gid> for String {
    fn from(gid: Gid) -> Self {
        gid.0
    }
}

impl Borrow<str> for Gid {
    fn borrow(&self) -> &str {
        &self.0
    }
}
