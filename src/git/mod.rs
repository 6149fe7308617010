//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. The sync store's history is
//! written and read through this interface; no other module imports
//! `git2`. We use the `git2` crate exclusively (no shelling out to the git
//! CLI).
//!
//! # Responsibilities
//!
//! - Repository initialization and opening
//! - Staging and committing the working tree
//! - History walks and reading files as committed
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, CommitInfo)
//! - A commit is only made on top of the current HEAD

mod interface;

pub use interface::{Author, CommitInfo, Git, GitError};
