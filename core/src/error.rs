use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// One entry of the oversize diagnostic: a project-root-relative path and the
/// file's raw size. Serializable so front-ends can render the list in their
/// own vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LargeFile {
    pub rel_path: String,
    pub size_bytes: u64,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Project root '{path}' does not exist or is not a directory")]
    InvalidRoot { path: PathBuf },

    #[error("Target path '{target}' does not exist")]
    TargetNotFound { target: PathBuf },

    #[error("Target path '{target}' is outside the project root '{root}'")]
    TargetOutsideRoot { target: PathBuf, root: PathBuf },

    #[error("Failed to read rule file '{path}': {source}")]
    RuleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Total context size {observed_bytes} bytes exceeds the limit of {limit_bytes} bytes"
    )]
    SizeLimitExceeded {
        limit_bytes: u64,
        observed_bytes: u64,
        largest_files: Vec<LargeFile>,
    },

    #[error("Context gathering cancelled")]
    Cancelled,

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern matcher error: {0}")]
    Ignore(#[from] ignore::Error),
}
