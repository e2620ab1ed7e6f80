use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Options for one two-way comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Domain characters used to prefix historical paths, `@<domain>/`.
    pub domains: [char; 2],
    /// Labels for the per-side sections of each change record.
    pub labels: [String; 2],
    /// Sort records by their current path. Callers that re-sort a merged
    /// superset can turn this off.
    pub sort: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            domains: ['0', '1'],
            labels: ["orig".into(), "dest".into()],
            sort: true,
        }
    }
}

impl DiffOptions {
    /// Options whose labels are the domain characters themselves, as used
    /// for the pairwise comparisons of a merge (`A`/`B`/`C`/`M`).
    pub fn with_domains(orig: char, dest: char) -> Self {
        Self {
            domains: [orig, dest],
            labels: [orig.to_string(), dest.to_string()],
            sort: true,
        }
    }

    pub fn unsorted(mut self) -> Self {
        self.sort = false;
        self
    }

    pub fn validate(&self) -> DiffResult<()> {
        let [a, b] = self.domains;
        if a == b {
            return Err(DiffError::InvalidOptions(format!(
                "both sides use domain '{a}'"
            )));
        }
        if self.domains.iter().any(|d| *d == '/' || d.is_whitespace()) {
            return Err(DiffError::InvalidOptions(
                "domain characters must be printable and not '/'".into(),
            ));
        }
        Ok(())
    }
}
