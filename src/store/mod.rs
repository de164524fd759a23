//! storage layer for GitPages
//!
//! this module maps logical page paths onto read, write, and atomic commit
//! operations against a Git working tree. The upper layers (HTTP handlers,
//! CLI) use this API and never touch git2 directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       PageStore                             │
//! │   (pages/ namespace, document codec, raw bypasses)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │  document   │       │  GitStore   │       │   history   │
//!  │  (codec)    │       │ (raw I/O +  │       │ (per-path   │
//!  │             │       │  commits)   │       │  commits)   │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!                              │
//!                              ▼
//!                        ┌─────────────┐
//!                        │   chroot    │
//!                        │ (sandboxed  │
//!                        │   views)    │
//!                        └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gitpages::store::{Author, CommitMeta, Document, GitStore, PageStore};
//!
//! // Open or initialize
//! let store = GitStore::open_or_init("./wiki")?;
//! let pages = PageStore::new(store);
//!
//! // Save a page (one commit per save)
//! let meta = CommitMeta::new("init", Author::new("bob", "bob@x.com"));
//! pages.save_page("intro", &Document::new("Hello"), &meta)?;
//!
//! // Read back
//! let doc = pages.get_page("intro")?;
//!
//! // Trace the audit trail
//! let commits = pages.page_history("intro", None)?;
//! ```

mod chroot;
mod document;
mod error;
mod history;
mod pages;
mod repository;
mod types;

// Re-export public API
pub use chroot::ChrootView;
pub use document::{decode_document, encode_document, Document, DocumentMeta};
pub use error::{IoPhase, StoreError, StoreResult};
pub use history::CommitInfo;
pub use pages::PageStore;
pub use repository::GitStore;
pub use types::{Author, CommitId, CommitMeta};
