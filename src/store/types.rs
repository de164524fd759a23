//! core type-safe wrappers around git primitives for the store layer.

use std::fmt;

use git2::Oid;
use serde::{Deserialize, Serialize};

/// This makes sure we don't accidentally pass some other hex string where a
/// commit ID is expected. The inner Oid is only accessible within the store
/// module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitId(pub(crate) Oid);

impl CommitId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    /// parse CommitId from a hex string
    pub fn from_hex(hex: &str) -> Result<Self, git2::Error> {
        Oid::from_str(hex).map(CommitId)
    }

    /// short form of the commit ID
    pub fn short(&self) -> String {
        self.0.to_string()[..7].to_string()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// who a change is attributed to
///
/// supplied by the caller; username and email are taken as-is, the store
/// does not validate email format or username uniqueness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub email: String,
}

impl Author {
    /// create a new author
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }

    /// convert to a git2::Signature stamped with the current time
    ///
    /// the timestamp is always assigned here, never supplied by the caller
    pub(crate) fn signature(&self) -> Result<git2::Signature<'static>, git2::Error> {
        git2::Signature::now(&self.username, &self.email)
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.username, self.email)
    }
}

/// message and attribution for one save operation
///
/// produced exactly once per successful save; the resulting commit is never
/// mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    pub message: String,
    pub author: Author,
}

impl CommitMeta {
    /// create commit metadata
    pub fn new(message: impl Into<String>, author: Author) -> Self {
        Self {
            message: message.into(),
            author,
        }
    }
}
