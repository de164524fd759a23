//! Page-oriented facade over the raw store.
//!
//! Pages live under a fixed `pages/` subtree of the repository root, one
//! codec-encoded file per page path. The raw and chroot operations bypass
//! both the prefix and the codec - they are for non-document assets such as
//! per-page attachments.

use std::path::{Path, PathBuf};

use crate::store::document::{decode_document, encode_document, Document};
use crate::store::error::StoreResult;
use crate::store::history::CommitInfo;
use crate::store::repository::GitStore;
use crate::store::types::{CommitId, CommitMeta};

/// subtree of the repository root that holds all pages
const PAGES_DIR: &str = "pages";

/// Page operations on top of a [`GitStore`].
///
/// Cheap to clone; shares the underlying repository handle.
#[derive(Clone)]
pub struct PageStore {
    store: GitStore,
}

impl PageStore {
    /// Wrap an already-constructed store.
    pub fn new(store: GitStore) -> Self {
        Self { store }
    }

    /// Access the raw store underneath.
    pub fn store(&self) -> &GitStore {
        &self.store
    }

    fn page_path(path: &Path) -> PathBuf {
        Path::new(PAGES_DIR).join(path)
    }

    // ==================== Page Operations ====================

    /// True iff a page (or page directory) exists at `path`.
    pub fn has_page(&self, path: impl AsRef<Path>) -> bool {
        self.store.exists(Self::page_path(path.as_ref()))
    }

    /// Read and decode the page at `path`.
    pub fn get_page(&self, path: impl AsRef<Path>) -> StoreResult<Document> {
        let data = self.store.read_raw(Self::page_path(path.as_ref()))?;
        decode_document(&data)
    }

    /// Encode `document` and write it at `path`, recorded as one commit.
    ///
    /// A failed encode never touches the filesystem.
    pub fn save_page(
        &self,
        path: impl AsRef<Path>,
        document: &Document,
        meta: &CommitMeta,
    ) -> StoreResult<CommitId> {
        let data = encode_document(document)?;
        self.store
            .write_and_commit(Self::page_path(path.as_ref()), &data, meta)
    }

    /// Ensure all intermediate directories under `pages/path` exist.
    ///
    /// Idempotent; directories only become part of history once a page is
    /// saved inside them.
    pub fn create_page_dir(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        self.store.create_dir_all(Self::page_path(path.as_ref()))
    }

    /// Commits that touched the page at `path`, newest first.
    pub fn page_history(
        &self,
        path: impl AsRef<Path>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<CommitInfo>> {
        self.store.history_of(Self::page_path(path.as_ref()), limit)
    }

    // ==================== Raw Bypasses ====================

    /// Read raw bytes at a repository-root-relative path (no prefix, no codec).
    pub fn get_raw(&self, path: impl AsRef<Path>) -> StoreResult<Vec<u8>> {
        self.store.read_raw(path)
    }

    /// Write raw bytes at a repository-root-relative path, as one commit.
    pub fn save_raw(
        &self,
        path: impl AsRef<Path>,
        data: &[u8],
        meta: &CommitMeta,
    ) -> StoreResult<CommitId> {
        self.store.write_and_commit(path, data, meta)
    }

    // ==================== Chroot-scoped Assets ====================

    /// Existence check scoped to an arbitrary chroot.
    ///
    /// Never raises: a base directory that fails to resolve reads as
    /// "does not exist".
    pub fn exists_in_chroot(&self, basedir: impl AsRef<Path>, path: impl AsRef<Path>) -> bool {
        match self.store.chroot(basedir) {
            Ok(view) => view.exists(path),
            Err(_) => false,
        }
    }

    /// Read raw bytes through a chroot view.
    pub fn get_in_chroot(
        &self,
        basedir: impl AsRef<Path>,
        path: impl AsRef<Path>,
    ) -> StoreResult<Vec<u8>> {
        self.store.chroot(basedir)?.read_raw(path)
    }

    /// Write raw bytes through a chroot view, as one commit.
    pub fn save_in_chroot(
        &self,
        basedir: impl AsRef<Path>,
        path: impl AsRef<Path>,
        data: &[u8],
        meta: &CommitMeta,
    ) -> StoreResult<CommitId> {
        self.store.chroot(basedir)?.write_and_commit(path, data, meta)
    }
}
