//! # gitcore
//!
//! The storage core of a Git-compatible version control system, in pure
//! Rust.
//!
//! This crate reads and writes the on-disk formats Git uses without
//! libgit2 or the git command-line tool. Everything it writes hashes to
//! the same ids Git would produce.
//!
//! ## Features
//!
//! - Loose object database: read, write, hash, prefix lookup
//! - Object codecs for blobs, trees, commits and annotated tags
//! - Index (staging area) file, version 2
//! - Building nested trees from a flat index
//! - Name resolution over hashes, tags and branches
//!
//! ## Quick Start
//!
//! ```no_run
//! use gitcore::{Repository, Result, Signature};
//!
//! fn main() -> Result<()> {
//!     let repo = Repository::open("path/to/repo")?;
//!
//!     // Commit whatever is staged
//!     let who = Signature::now("Jane Doe", "jane@example.com");
//!     let commit = repo.commit_index("Snapshot", &who)?;
//!
//!     // List the committed files
//!     for (path, oid) in repo.tree_to_map(&commit.to_hex())? {
//!         println!("{} {}", oid.short(), path);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`error`] - Error types and Result alias
//! - [`repository`] - Main `Repository` type tying the pieces together
//! - [`objects`] - Git object types and the loose object store
//! - [`refs`] - References (HEAD, branches, tags)
//! - [`index`] - Index (staging area) codec
//! - [`tree_builder`] - Index to tree conversion

pub mod error;
pub mod index;
pub mod objects;
pub mod refs;
pub mod repository;
pub mod tree_builder;

// Internal modules (not part of public API)
pub(crate) mod infra;

pub use error::{Error, ErrorKind, Result};
pub use repository::{LsTreeEntry, Repository, RepositoryOptions};

pub use objects::{
    Blob, Commit, FileMode, Kvlm, LooseObjectStore, Mode, Object, ObjectType, Oid, Signature,
    Tag, Tree, TreeEntry,
};

pub use refs::{RefStore, RefValue, ResolvedRef};

pub use index::{Index, IndexEntry, ModeType, Timestamp};
