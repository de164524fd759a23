//! Per-path commit history.
//!
//! History is a derived, read-only query: starting from HEAD, walk the
//! commit log newest-first and keep the commits whose tree diff against the
//! first parent touches the queried path. Every query re-walks from HEAD -
//! there is no cached cursor.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{DiffOptions, ErrorCode, Repository, Revwalk, Sort};

use crate::store::error::StoreResult;
use crate::store::types::CommitId;

/// information about a commit
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub id: CommitId,
    pub parent_ids: Vec<CommitId>,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitInfo {
    /// create CommitInfo from a git2::Commit
    pub(crate) fn from_git2(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        let time = commit.time();
        let timestamp = Utc
            .timestamp_opt(time.seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now);

        Self {
            id: CommitId::new(commit.id()),
            parent_ids: commit.parent_ids().map(CommitId::new).collect(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or("unknown@unknown").to_string(),
            timestamp,
        }
    }

    /// get a short summary of the commit (first line of message)
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or(&self.message)
    }
}

/// collect the commits that touched `path`, newest first
///
/// an unborn HEAD or a log that cannot be opened yields an empty list; a
/// failure on an individual commit mid-walk propagates, since that points
/// at repository corruption rather than absent history
pub(crate) fn collect(
    repo: &Repository,
    path: &Path,
    limit: Option<usize>,
) -> StoreResult<Vec<CommitInfo>> {
    let revwalk = match open_log(repo) {
        Some(revwalk) => revwalk,
        None => return Ok(Vec::new()),
    };

    let mut commits = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        if touches_path(repo, &commit, path)? {
            commits.push(CommitInfo::from_git2(&commit));
            if limit.is_some_and(|n| commits.len() >= n) {
                break;
            }
        }
    }

    Ok(commits)
}

/// start a newest-first walk from HEAD; `None` when there is nothing to walk
fn open_log(repo: &Repository) -> Option<Revwalk<'_>> {
    let head = match repo.head() {
        Ok(head) => head.peel_to_commit().ok()?.id(),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return None
        }
        Err(_) => return None,
    };

    let mut revwalk = repo.revwalk().ok()?;
    revwalk.push(head).ok()?;
    revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL).ok()?;

    Some(revwalk)
}

/// did this commit change `path`, compared to its first parent?
///
/// a root commit diffs against the empty tree
fn touches_path(repo: &Repository, commit: &git2::Commit<'_>, path: &Path) -> StoreResult<bool> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };

    let mut opts = DiffOptions::new();
    opts.pathspec(path);
    opts.disable_pathspec_match(true);

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;
    Ok(diff.deltas().count() > 0)
}
