//! Core Git repository wrapper.
//!
//! This is the central component of the store layer. It wraps
//! `git2::Repository` with thread-safe access and turns successful working
//! tree writes into durable, attributed commits.
//!
//! All other store modules use this for Git access.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::{ErrorCode, Repository};
use parking_lot::RwLock;

use crate::store::chroot::{confine, ChrootView};
use crate::store::error::{IoPhase, StoreError, StoreResult};
use crate::store::history::{self, CommitInfo};
use crate::store::types::{CommitId, CommitMeta};

/// permission bits applied to files created by write operations
pub(crate) const DEFAULT_FILE_MODE: u32 = 0o644;

/// The main Git repository wrapper.
///
/// This provides thread-safe access to the working tree and commit log.
/// Clone this to share across threads - it uses Arc internally. The write
/// lock is held across the whole write+stage+commit sequence, so two
/// writers can never interleave their staged changes.
#[derive(Clone)]
pub struct GitStore {
    inner: Arc<GitStoreInner>,
}

struct GitStoreInner {
    repo: RwLock<Repository>,
    path: PathBuf,
    workdir: PathBuf,
    file_mode: u32,
}

impl GitStore {
    /// Open an existing repository.
    ///
    /// The repository must have a working tree; bare repositories are
    /// rejected because every store operation goes through checked-out files.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let repo =
            Repository::open(path).map_err(|_| StoreError::NotARepository(path.to_path_buf()))?;

        Self::from_repo(repo, path)
    }

    /// Initialize a new repository.
    ///
    /// No initial commit is created: a brand-new store has no history, and
    /// that is a valid state. The first successful write creates the root
    /// commit.
    pub fn init(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let repo = Repository::init(path)?;

        Self::from_repo(repo, path)
    }

    /// Open or initialize a repository.
    pub fn open_or_init(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.join(".git").exists() {
            Self::open(path)
        } else {
            Self::init(path)
        }
    }

    fn from_repo(repo: Repository, path: &Path) -> StoreResult<Self> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| StoreError::BareRepository(path.to_path_buf()))?
            .to_path_buf();

        Ok(Self {
            inner: Arc::new(GitStoreInner {
                repo: RwLock::new(repo),
                path: path.to_path_buf(),
                workdir,
                file_mode: DEFAULT_FILE_MODE,
            }),
        })
    }

    /// Get the repository path.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Set the permission mode for files created by writes.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        // We need to recreate the Arc with the new mode
        let inner = Arc::get_mut(&mut self.inner).expect("cannot modify shared store");
        inner.file_mode = mode;
        self
    }

    /// Execute a function with read access to the repository.
    pub(crate) fn with_repo<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Repository) -> StoreResult<T>,
    {
        let repo = self.inner.repo.read();
        f(&repo)
    }

    /// Execute a function with write access to the repository.
    pub(crate) fn with_repo_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Repository) -> StoreResult<T>,
    {
        let repo = self.inner.repo.write();
        f(&repo)
    }

    // ==================== Raw File Operations ====================

    /// Read the full contents of a file relative to the tree root.
    ///
    /// Fails with `NotFound` if the path does not exist, `IsDirectory` if it
    /// names a directory, and a phase-tagged `Io` error otherwise. No side
    /// effects.
    pub fn read_raw(&self, path: impl AsRef<Path>) -> StoreResult<Vec<u8>> {
        self.read_file_at(&self.inner.workdir, path.as_ref())
    }

    /// Write a file relative to the tree root and record it as a commit.
    ///
    /// The file is created or truncated, written, and synced; only then is
    /// the path staged and the commit created with an author signature built
    /// from `meta` and a timestamp of now. If staging or committing fails
    /// the content has already changed on disk but is not part of version
    /// history - the `Stage`/`Commit` error variants surface that window,
    /// and nothing is retried.
    ///
    /// Intermediate directories are not created implicitly; writing into a
    /// missing directory fails at the open phase and leaves history
    /// unchanged.
    pub fn write_and_commit(
        &self,
        path: impl AsRef<Path>,
        data: &[u8],
        meta: &CommitMeta,
    ) -> StoreResult<CommitId> {
        self.commit_file_at(&self.inner.workdir, Path::new(""), path.as_ref(), data, meta)
    }

    /// True iff `path` resolves to a stat-able entry (file or directory).
    ///
    /// Existence checks never raise: "does not exist" and every other stat
    /// failure both come back as `false`.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.exists_at(&self.inner.workdir, path.as_ref())
    }

    /// Ensure all directories along `path` exist under the tree root.
    ///
    /// Idempotent: an already-existing directory tree is a no-op success.
    pub fn create_dir_all(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let rel = confine(path.as_ref())?;
        fs::create_dir_all(self.inner.workdir.join(&rel)).map_err(|e| StoreError::Io {
            phase: IoPhase::CreateDir,
            path: rel,
            source: e,
        })
    }

    /// Produce a sandboxed view rooted at `basedir`.
    ///
    /// Fails with `ChrootInvalid` if `basedir` does not resolve to an
    /// existing directory inside the tree.
    pub fn chroot(&self, basedir: impl AsRef<Path>) -> StoreResult<ChrootView> {
        let prefix =
            confine(basedir.as_ref()).map_err(|_| StoreError::ChrootInvalid(basedir.as_ref().to_path_buf()))?;
        let root = self.inner.workdir.join(&prefix);

        match fs::metadata(&root) {
            Ok(md) if md.is_dir() => Ok(ChrootView::new(self.clone(), root, prefix)),
            _ => Err(StoreError::ChrootInvalid(basedir.as_ref().to_path_buf())),
        }
    }

    // ==================== History Operations ====================

    /// Get the current HEAD commit, or `None` when no commit exists yet.
    pub fn head(&self) -> StoreResult<Option<CommitId>> {
        self.with_repo(|repo| match repo.head() {
            Ok(head) => {
                let commit = head.peel_to_commit()?;
                Ok(Some(CommitId::new(commit.id())))
            }
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        })
    }

    /// Commits that touched `path`, newest first.
    ///
    /// Walks the log from HEAD on every call. An empty repository (or a log
    /// that cannot be opened) yields an empty list, not an error: history
    /// absence is a valid terminal state for a brand-new store.
    pub fn history_of(
        &self,
        path: impl AsRef<Path>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<CommitInfo>> {
        let rel = confine(path.as_ref())?;
        self.with_repo(|repo| history::collect(repo, &rel, limit))
    }

    // ==================== Internals shared with ChrootView ====================

    pub(crate) fn read_file_at(&self, root: &Path, path: &Path) -> StoreResult<Vec<u8>> {
        let rel = confine(path)?;
        let abs = root.join(&rel);

        // Stat first: a directory is a distinct failure, not a read error
        let md = fs::metadata(&abs).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(rel.clone())
            } else {
                StoreError::Io {
                    phase: IoPhase::Stat,
                    path: rel.clone(),
                    source: e,
                }
            }
        })?;

        if md.is_dir() {
            return Err(StoreError::IsDirectory(rel));
        }

        let mut file = fs::File::open(&abs).map_err(|e| StoreError::Io {
            phase: IoPhase::Open,
            path: rel.clone(),
            source: e,
        })?;

        let mut data = Vec::with_capacity(md.len() as usize);
        file.read_to_end(&mut data).map_err(|e| StoreError::Io {
            phase: IoPhase::Read,
            path: rel.clone(),
            source: e,
        })?;

        Ok(data)
    }

    pub(crate) fn exists_at(&self, root: &Path, path: &Path) -> bool {
        match confine(path) {
            Ok(rel) => fs::symlink_metadata(root.join(rel)).is_ok(),
            Err(_) => false,
        }
    }

    pub(crate) fn commit_file_at(
        &self,
        root: &Path,
        prefix: &Path,
        path: &Path,
        data: &[u8],
        meta: &CommitMeta,
    ) -> StoreResult<CommitId> {
        let rel = confine(path)?;
        let abs = root.join(&rel);
        // Staging always addresses the true repository root
        let repo_rel = prefix.join(&rel);

        self.with_repo_mut(|repo| {
            write_file(&abs, &repo_rel, data, self.inner.file_mode)?;

            // Stage
            let mut index = repo.index().map_err(|e| StoreError::Stage {
                path: repo_rel.clone(),
                source: e,
            })?;
            index.add_path(&repo_rel).map_err(|e| StoreError::Stage {
                path: repo_rel.clone(),
                source: e,
            })?;
            index.write().map_err(|e| StoreError::Stage {
                path: repo_rel.clone(),
                source: e,
            })?;

            // Commit
            create_commit(repo, &mut index, &repo_rel, meta)
        })
    }
}

/// open, write, and sync the file; phases surface individually
fn write_file(abs: &Path, repo_rel: &Path, data: &[u8], mode: u32) -> StoreResult<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts.open(abs).map_err(|e| StoreError::Io {
        phase: IoPhase::Open,
        path: repo_rel.to_path_buf(),
        source: e,
    })?;

    file.write_all(data).map_err(|e| StoreError::Io {
        phase: IoPhase::Write,
        path: repo_rel.to_path_buf(),
        source: e,
    })?;

    file.sync_all().map_err(|e| StoreError::Io {
        phase: IoPhase::Close,
        path: repo_rel.to_path_buf(),
        source: e,
    })
}

/// turn the staged index into a commit on HEAD
fn create_commit(
    repo: &Repository,
    index: &mut git2::Index,
    repo_rel: &Path,
    meta: &CommitMeta,
) -> StoreResult<CommitId> {
    let commit_err = |source: git2::Error| StoreError::Commit {
        path: repo_rel.to_path_buf(),
        source,
    };

    let tree_id = index.write_tree().map_err(commit_err)?;
    let tree = repo.find_tree(tree_id).map_err(commit_err)?;
    let sig = meta.author.signature().map_err(commit_err)?;

    // Unborn HEAD means this will be the root commit
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(commit_err)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(commit_err(e)),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, &meta.message, &tree, &parents)
        .map_err(commit_err)?;

    Ok(CommitId::new(oid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::Author;
    use tempfile::TempDir;

    fn setup() -> (TempDir, GitStore) {
        let dir = TempDir::new().unwrap();
        let store = GitStore::init(dir.path()).unwrap();
        (dir, store)
    }

    fn meta(message: &str) -> CommitMeta {
        CommitMeta::new(message, Author::new("bob", "bob@x.com"))
    }

    #[test]
    fn test_init_and_open() {
        let dir = TempDir::new().unwrap();

        let store = GitStore::init(dir.path()).unwrap();
        assert!(store.head().unwrap().is_none()); // no initial commit

        drop(store);
        let store = GitStore::open(dir.path()).unwrap();
        assert!(store.head().unwrap().is_none());
    }

    #[test]
    fn test_open_missing_repository() {
        let dir = TempDir::new().unwrap();
        let result = GitStore::open(dir.path().join("nope"));
        assert!(matches!(result, Err(StoreError::NotARepository(_))));
    }

    #[test]
    fn test_open_or_init() {
        let dir = TempDir::new().unwrap();

        let store1 = GitStore::open_or_init(dir.path()).unwrap();
        let head1 = store1.write_and_commit("a.txt", b"one", &meta("first")).unwrap();

        drop(store1);
        let store2 = GitStore::open_or_init(dir.path()).unwrap();
        assert_eq!(store2.head().unwrap(), Some(head1));
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, store) = setup();

        store.write_and_commit("note.txt", b"hello", &meta("add note")).unwrap();
        let data = store.read_raw("note.txt").unwrap();
        assert_eq!(data, b"hello");
    }

    #[test]
    fn test_first_commit_has_no_parent() {
        let (_dir, store) = setup();

        let id = store.write_and_commit("a.txt", b"x", &meta("root")).unwrap();
        let history = store.history_of("a.txt", None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert!(history[0].parent_ids.is_empty());
    }

    #[test]
    fn test_commit_records_author_and_message() {
        let (_dir, store) = setup();

        let commit = CommitMeta::new("init", Author::new("bob", "bob@x.com"));
        store.write_and_commit("a.txt", b"x", &commit).unwrap();

        let history = store.history_of("a.txt", None).unwrap();
        assert_eq!(history[0].message, "init");
        assert_eq!(history[0].author_name, "bob");
        assert_eq!(history[0].author_email, "bob@x.com");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let (_dir, store) = setup();

        let result = store.read_raw("nope.txt");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_read_directory_is_distinct_error() {
        let (_dir, store) = setup();

        store.create_dir_all("sub").unwrap();
        let result = store.read_raw("sub");
        assert!(matches!(result, Err(StoreError::IsDirectory(_))));
    }

    #[test]
    fn test_exists_never_raises() {
        let (_dir, store) = setup();

        assert!(!store.exists("nope.txt"));
        assert!(!store.exists("../outside")); // confinement failure is also false

        store.write_and_commit("a.txt", b"x", &meta("add")).unwrap();
        assert!(store.exists("a.txt"));

        store.create_dir_all("sub").unwrap();
        assert!(store.exists("sub")); // directories count as existing
    }

    #[test]
    fn test_write_into_missing_dir_leaves_history_unchanged() {
        let (_dir, store) = setup();

        let result = store.write_and_commit("missing/a.txt", b"x", &meta("add"));
        assert!(matches!(
            result,
            Err(StoreError::Io { phase: IoPhase::Open, .. })
        ));

        assert!(store.head().unwrap().is_none());
        assert!(store.history_of("missing/a.txt", None).unwrap().is_empty());
    }

    #[test]
    fn test_write_rejects_escaping_path() {
        let (_dir, store) = setup();

        let result = store.write_and_commit("../escape.txt", b"x", &meta("add"));
        assert!(matches!(result, Err(StoreError::PathOutsideTree(_))));
    }

    #[test]
    fn test_create_dir_all_is_idempotent() {
        let (_dir, store) = setup();

        store.create_dir_all("a/b/c").unwrap();
        store.create_dir_all("a/b/c").unwrap();
        assert!(store.exists("a/b/c"));
    }

    #[test]
    fn test_overwrite_creates_new_commit() {
        let (_dir, store) = setup();

        store.write_and_commit("a.txt", b"one", &meta("first")).unwrap();
        store.write_and_commit("a.txt", b"two", &meta("second")).unwrap();

        assert_eq!(store.read_raw("a.txt").unwrap(), b"two");

        let history = store.history_of("a.txt", None).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "second"); // newest first
        assert_eq!(history[1].message, "first");
    }

    #[test]
    fn test_commits_are_chained() {
        let (_dir, store) = setup();

        let first = store.write_and_commit("a.txt", b"one", &meta("first")).unwrap();
        let second = store.write_and_commit("b.txt", b"two", &meta("second")).unwrap();

        assert_eq!(store.head().unwrap(), Some(second));
        let history = store.history_of("b.txt", None).unwrap();
        assert_eq!(history[0].parent_ids, vec![first]);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_mode_applied_to_created_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = GitStore::init(dir.path()).unwrap().with_file_mode(0o600);

        store.write_and_commit("secret.txt", b"x", &meta("add")).unwrap();

        let md = std::fs::metadata(dir.path().join("secret.txt")).unwrap();
        assert_eq!(md.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_chroot_requires_existing_directory() {
        let (_dir, store) = setup();

        assert!(matches!(
            store.chroot("nope"),
            Err(StoreError::ChrootInvalid(_))
        ));

        store.write_and_commit("file.txt", b"x", &meta("add")).unwrap();
        assert!(matches!(
            store.chroot("file.txt"), // a file is not a valid base
            Err(StoreError::ChrootInvalid(_))
        ));

        store.create_dir_all("sandbox").unwrap();
        assert!(store.chroot("sandbox").is_ok());
    }

    #[test]
    fn test_chroot_views_are_isolated() {
        let (_dir, store) = setup();

        store.create_dir_all("a").unwrap();
        store.create_dir_all("b").unwrap();
        let view_a = store.chroot("a").unwrap();
        let view_b = store.chroot("b").unwrap();

        view_a.write_and_commit("x", b"from a", &meta("write in a")).unwrap();

        assert!(view_a.exists("x"));
        assert!(!view_b.exists("x"));
        assert!(view_b.read_raw("x").is_err());
    }

    #[test]
    fn test_chroot_write_stages_at_repo_root() {
        let (_dir, store) = setup();

        store.create_dir_all("attachments/intro").unwrap();
        let view = store.chroot("attachments/intro").unwrap();
        let id = view.write_and_commit("logo.png", b"\x89PNG", &meta("add logo")).unwrap();

        // The write is visible (and has history) at the true repository root
        assert_eq!(
            store.read_raw("attachments/intro/logo.png").unwrap(),
            b"\x89PNG"
        );
        let history = store.history_of("attachments/intro/logo.png", None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
    }

    #[test]
    fn test_chroot_view_cannot_escape() {
        let (_dir, store) = setup();

        store.create_dir_all("sandbox").unwrap();
        store.write_and_commit("top.txt", b"secret", &meta("add top")).unwrap();
        let view = store.chroot("sandbox").unwrap();

        assert!(matches!(
            view.read_raw("../top.txt"),
            Err(StoreError::PathOutsideTree(_))
        ));
        assert!(!view.exists("../top.txt"));
    }
}
