//! Sandboxed views of the working tree.
//!
//! A [`ChrootView`] is a capability: it carries a resolved root below the
//! repository working tree and only exposes view-relative operations, so a
//! caller holding a view cannot name paths outside it. Writes through a view
//! still stage at the real repository root (`basedir/path`), because the
//! index and commit mechanism always operate on the whole tree.

use std::path::{Component, Path, PathBuf};

use crate::store::error::{StoreError, StoreResult};
use crate::store::repository::GitStore;
use crate::store::types::{CommitId, CommitMeta};

/// normalize a caller-supplied relative path to a tree-relative form
///
/// `.` components drop out, `..` pops within the tree and fails once it
/// would cross the tree root; absolute paths and drive prefixes fail
pub(crate) fn confine(path: &Path) -> StoreResult<PathBuf> {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return Err(StoreError::PathOutsideTree(path.to_path_buf()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(StoreError::PathOutsideTree(path.to_path_buf()));
            }
        }
    }

    Ok(out)
}

/// A restricted filesystem view rooted at a subdirectory of the working tree.
///
/// Produced by [`GitStore::chroot`]. The view shares the underlying
/// repository handle - it is not a separate repository, and a commit made
/// through it lands in the same history as root-level commits.
#[derive(Clone)]
pub struct ChrootView {
    store: GitStore,
    /// absolute path of the view root on disk
    root: PathBuf,
    /// view root relative to the repository root, used for staging
    prefix: PathBuf,
}

impl ChrootView {
    pub(crate) fn new(store: GitStore, root: PathBuf, prefix: PathBuf) -> Self {
        Self { store, root, prefix }
    }

    /// the view root relative to the repository root
    pub fn base(&self) -> &Path {
        &self.prefix
    }

    /// read the full contents of a file inside the view
    pub fn read_raw(&self, path: impl AsRef<Path>) -> StoreResult<Vec<u8>> {
        self.store.read_file_at(&self.root, path.as_ref())
    }

    /// write a file inside the view and record the change as a commit
    ///
    /// staging uses the repository-root path `base/path`; see
    /// [`GitStore::write_and_commit`] for the ordering contract
    pub fn write_and_commit(
        &self,
        path: impl AsRef<Path>,
        data: &[u8],
        meta: &CommitMeta,
    ) -> StoreResult<CommitId> {
        self.store
            .commit_file_at(&self.root, &self.prefix, path.as_ref(), data, meta)
    }

    /// true iff `path` resolves to a stat-able entry inside the view
    ///
    /// never raises; any failure to stat is "does not exist"
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.store.exists_at(&self.root, path.as_ref())
    }

    /// repository-root-relative form of a view path
    ///
    /// useful to query history for a file that was written through the view
    pub fn root_rel(&self, path: impl AsRef<Path>) -> StoreResult<PathBuf> {
        Ok(self.prefix.join(confine(path.as_ref())?))
    }
}
