use thiserror::Error;

/// Errors produced while parsing or constructing identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid gid {0:?}: {1}")]
    InvalidGid(String, &'static str),
}
