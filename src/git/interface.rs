//! git::interface
//!
//! Git interface implementation using git2.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to interact with the sync store's
//! repository. No other module imports `git2` directly, so:
//!
//! - Error handling is consistent across all Git operations
//! - Results cross the boundary as strong types ([`Oid`], [`CommitInfo`])
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: No repository at the given path
//! - [`GitError::ObjectNotFound`]: Requested commit or blob does not exist
//! - [`GitError::InvalidOid`]: Malformed object id
//! - [`GitError::AccessError`]: Repository locked or unreadable
//!
//! # Example
//!
//! ```ignore
//! use cloudgraph::git::{Author, Git};
//!
//! let git = Git::init_or_open(&paths.repo_dir())?;
//! git.stage_all()?;
//! if git.has_staged_changes()? {
//!     let oid = git.commit("sync 2 services", &Author::default())?;
//!     println!("committed {}", oid.short(7));
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::config::{DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME};
use crate::core::types::{Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository at the given path.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::Locked => GitError::AccessError {
                message: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidOid {
            oid: err.to_string(),
        }
    }
}

/// Identity recorded on sync commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for Author {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHOR_NAME, DEFAULT_AUTHOR_EMAIL)
    }
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub author_time: DateTime<Utc>,
}

/// The single interface for Git operations.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("git_dir", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open the repository whose working tree is `path`.
    ///
    /// Unlike discovery, parent directories are not searched: the store
    /// must never commit into an enclosing repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Open the repository at `path`, initializing it first if needed.
    pub fn init_or_open(path: &Path) -> Result<Self, GitError> {
        match Self::open(path) {
            Ok(git) => Ok(git),
            Err(GitError::NotARepo { .. }) => {
                let repo = git2::Repository::init(path)
                    .map_err(|e| GitError::from_git2(e, &path.display().to_string()))?;
                Ok(Self { repo })
            }
            Err(e) => Err(e),
        }
    }

    /// Get direct access to the .git directory path.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // HEAD
    // =========================================================================

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if HEAD is unborn (new repository)
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// HEAD commit OID, or `None` before the first commit.
    pub fn try_head_oid(&self) -> Result<Option<Oid>, GitError> {
        match self.repo.head() {
            Ok(head) => {
                let oid = head
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, "HEAD"))?
                    .id();
                Ok(Some(Oid::new(oid.to_string())?))
            }
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(GitError::from_git2(e, "HEAD")),
        }
    }

    /// Resolve a revision expression (`HEAD`, `HEAD~2`, a full or
    /// abbreviated commit id) to a commit OID.
    pub fn resolve_revision(&self, spec: &str) -> Result<Oid, GitError> {
        let commit = self
            .repo
            .revparse_single(spec)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, spec))?;

        Oid::new(commit.id().to_string()).map_err(|e| e.into())
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>, GitError> {
        match self.try_head_oid()? {
            Some(oid) => Ok(Some(self.find_commit(&oid)?)),
            None => Ok(None),
        }
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let git_oid =
            git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        self.repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    // =========================================================================
    // Index and Commits
    // =========================================================================

    /// Stage every change of the working tree, deletions included.
    pub fn stage_all(&self) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    /// Whether the staged tree differs from HEAD's tree.
    ///
    /// Before the first commit, any non-empty staged tree counts.
    pub fn has_staged_changes(&self) -> Result<bool, GitError> {
        let mut index = self.repo.index()?;
        let staged = index.write_tree()?;

        match self.head_commit()? {
            Some(head) => Ok(head.tree_id() != staged),
            None => Ok(self.repo.find_tree(staged)?.len() > 0),
        }
    }

    /// Commit the staged tree on top of HEAD.
    pub fn commit(&self, message: &str, author: &Author) -> Result<Oid, GitError> {
        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = git2::Signature::now(&author.name, &author.email)?;

        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    // =========================================================================
    // Commit Information
    // =========================================================================

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;
        let author = commit.author();
        let author_time = DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(DateTime::UNIX_EPOCH);

        Ok(CommitInfo {
            oid: oid.clone(),
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time,
        })
    }

    /// Up to `limit` commits reachable from HEAD, newest first.
    ///
    /// Empty before the first commit.
    pub fn log(&self, limit: usize) -> Result<Vec<CommitInfo>, GitError> {
        let Some(head) = self.try_head_oid()? else {
            return Ok(Vec::new());
        };

        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL)?;
        walk.push(git2::Oid::from_str(head.as_str())?)?;

        let mut commits = Vec::new();
        for oid in walk.take(limit) {
            let oid = Oid::new(oid?.to_string())?;
            commits.push(self.commit_info(&oid)?);
        }
        Ok(commits)
    }

    /// Content of `path` (relative, `/`-separated) as committed in `oid`.
    ///
    /// Returns `None` if the file is absent from that commit.
    pub fn read_file_at(&self, oid: &Oid, path: &str) -> Result<Option<Vec<u8>>, GitError> {
        let tree = self.find_commit(oid)?.tree()?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, path)),
        };

        let blob = entry
            .to_object(&self.repo)
            .and_then(|object| object.peel_to_blob())
            .map_err(|e| GitError::from_git2(e, path))?;

        Ok(Some(blob.content().to_vec()))
    }
}
