//! GitPages - A Git-backed Versioned Page Store
//!
//! This crate persists named "pages" (and raw byte blobs) inside a Git
//! repository. Every write is recorded as a commit with author and message
//! metadata, and every read can be traced back through history.
//!
//! # Example
//!
//! ```no_run
//! use gitpages::store::{Author, CommitMeta, Document, GitStore, PageStore};
//!
//! let store = GitStore::open_or_init("./wiki").unwrap();
//! let pages = PageStore::new(store);
//!
//! let doc = Document::new("# Hello").with_title("Front page");
//! let meta = CommitMeta::new("create front page", Author::new("bob", "bob@x.com"));
//! pages.save_page("index", &doc, &meta).unwrap();
//! ```

pub mod store;
