use serde::{Deserialize, Serialize};

/// Options for [`mstatus`](crate::mstatus).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MstatusOptions {
    /// Compare a single-parent changeset against its parent instead of
    /// failing with `NotAMerge`.
    pub allow_fallback: bool,
    /// Sort records by their current path.
    pub sort: bool,
}

impl Default for MstatusOptions {
    fn default() -> Self {
        Self {
            allow_fallback: true,
            sort: true,
        }
    }
}
