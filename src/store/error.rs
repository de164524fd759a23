//! Storage layer error types
//!
//! All errors that can occur during store operations are defined here
//! We use `thiserror` for ergonomic error definition and better error messages
//!
//! Every I/O, staging, and commit failure carries enough context to tell the
//! failing phase apart (stat vs open vs read vs write vs close vs stage vs
//! commit). Existence checks are the one place errors collapse to a boolean;
//! everything else is returned to the caller, never swallowed and never logged.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// the phase of a filesystem operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPhase {
    Stat,
    Open,
    Read,
    Write,
    Close,
    CreateDir,
}

impl fmt::Display for IoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            IoPhase::Stat => "stat",
            IoPhase::Open => "open",
            IoPhase::Read => "read",
            IoPhase::Write => "write",
            IoPhase::Close => "close",
            IoPhase::CreateDir => "create dir",
        };
        write!(f, "{}", phase)
    }
}

/// the main error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// the requested file was not found
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// the path names a directory, not a file
    #[error("path is a directory: {0}")]
    IsDirectory(PathBuf),

    /// a filesystem operation failed; the phase tells which one
    #[error("{phase} failed for {path}: {source}")]
    Io {
        phase: IoPhase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// the chroot base directory could not be resolved
    #[error("invalid chroot base: {0}")]
    ChrootInvalid(PathBuf),

    /// a relative path would escape the tree it is confined to
    #[error("path escapes the tree: {0}")]
    PathOutsideTree(PathBuf),

    /// the file was written to disk but staging it failed
    ///
    /// the change exists in the working tree and is NOT part of version
    /// history; the caller decides whether to revert, retry, or alert
    #[error("{path} was written but could not be staged: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// the file was written and staged but the commit was not created
    ///
    /// same inconsistency window as `Stage`: the audit trail does not
    /// record the on-disk change
    #[error("staged change to {path} was not committed: {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// bytes are not a well-formed encoded document
    #[error("malformed document: {0}")]
    Decode(#[source] serde_json::Error),

    /// encoder-internal fault; not expected in normal operation
    #[error("document encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// the repository has no working tree to operate on
    #[error("repository has no working tree: {0}")]
    BareRepository(PathBuf),

    /// no repository at the given path
    #[error("repository not found: {0}")]
    NotARepository(PathBuf),

    /// error from the underlying Git library
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

impl StoreError {
    /// check if this error indicates the file doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// check if this error left a disk change that version history missed
    ///
    /// `Stage` and `Commit` failures happen after the file content has
    /// already changed on disk
    pub fn is_unrecorded_write(&self) -> bool {
        matches!(self, StoreError::Stage { .. } | StoreError::Commit { .. })
    }
}

/// result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
