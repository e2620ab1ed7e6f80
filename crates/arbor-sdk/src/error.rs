use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("unknown changeset: {0}")]
    UnknownChangeset(String),

    #[error("ambiguous changeset {prefix}: matches {count} changesets")]
    AmbiguousChangeset { prefix: String, count: usize },

    #[error("changeset name already used: {0}")]
    DuplicateName(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] arbor_store::StoreError),

    #[error("history error: {0}")]
    Dag(#[from] arbor_dag::DagError),

    #[error("diff error: {0}")]
    Diff(#[from] arbor_diff::DiffError),

    #[error("merge status error: {0}")]
    Merge(#[from] arbor_merge::MergeError),
}

pub type SdkResult<T> = Result<T, SdkError>;
