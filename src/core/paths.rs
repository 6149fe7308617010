//! core::paths
//!
//! Centralized path routing for the sync store.
//!
//! # Architecture
//!
//! Every location the sync engine reads or writes is computed here. The
//! store root is an explicit value (normally resolved by
//! [`crate::core::config`]); nothing in this module consults the process
//! environment, so independent stores can coexist in one process.
//!
//! **Hard rule:** no other module may join region or service names onto a
//! store directory by hand. All paths go through `StorePaths`.
//!
//! # Storage Layout
//!
//! ```text
//! <root>/
//!   <provider>/
//!     <encoding>/              git working tree (the sync history)
//!       .git/
//!         cloudgraph/lock      commit lock (never committed)
//!       <region>/
//!         <service>.nt         one serialized graph per source
//! ```
//!
//! # Example
//!
//! ```
//! use cloudgraph::core::paths::StorePaths;
//! use cloudgraph::core::types::{Region, ServiceName};
//! use std::path::PathBuf;
//!
//! let paths = StorePaths::new(PathBuf::from("/home/me/.cloudgraph"), "aws", "rdf");
//! let region = Region::new("paris").unwrap();
//! let service = ServiceName::new("infra").unwrap();
//!
//! assert_eq!(
//!     paths.source_file(&region, &service),
//!     PathBuf::from("/home/me/.cloudgraph/aws/rdf/paris/infra.nt")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::{Region, ServiceName};

/// File extension of the native triple encoding.
pub const FILE_EXT: &str = "nt";

/// Default provider directory.
pub const DEFAULT_PROVIDER: &str = "aws";

/// Default encoding directory.
pub const DEFAULT_ENCODING: &str = "rdf";

/// Centralized path routing for one sync store.
///
/// # Invariants
///
/// - The repository directory is `<root>/<provider>/<encoding>`
/// - Source files live exactly one directory below the repository directory
/// - Lock files live under `.git/` so they are never staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
    provider: String,
    encoding: String,
}

impl StorePaths {
    /// Create paths for a store rooted at `root`.
    pub fn new(root: PathBuf, provider: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self {
            root,
            provider: provider.into(),
            encoding: encoding.into(),
        }
    }

    /// Create paths with the default provider and encoding.
    pub fn with_defaults(root: PathBuf) -> Self {
        Self::new(root, DEFAULT_PROVIDER, DEFAULT_ENCODING)
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The provider segment (e.g. `aws`).
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The encoding segment (e.g. `rdf`).
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// The version-controlled working tree: `<root>/<provider>/<encoding>`.
    pub fn repo_dir(&self) -> PathBuf {
        self.root.join(&self.provider).join(&self.encoding)
    }

    /// The git directory of the working tree.
    pub fn git_dir(&self) -> PathBuf {
        self.repo_dir().join(".git")
    }

    /// Directory for cloudgraph's private state inside `.git`.
    pub fn state_dir(&self) -> PathBuf {
        self.git_dir().join("cloudgraph")
    }

    /// The commit lock file: `<repo>/.git/cloudgraph/lock`.
    pub fn lock_path(&self) -> PathBuf {
        self.state_dir().join("lock")
    }

    /// Directory holding every source file of a region.
    pub fn region_dir(&self, region: &Region) -> PathBuf {
        self.repo_dir().join(region.as_str())
    }

    /// Absolute path of one source file.
    pub fn source_file(&self, region: &Region, service: &ServiceName) -> PathBuf {
        self.region_dir(region)
            .join(format!("{}.{}", service.as_str(), FILE_EXT))
    }

    /// Path of a source file relative to the working tree, with `/`
    /// separators, as recorded in the git tree.
    pub fn relative_source_file(&self, region: &Region, service: &ServiceName) -> String {
        format!("{}/{}.{}", region.as_str(), service.as_str(), FILE_EXT)
    }

    /// Ensure the working tree directory exists.
    ///
    /// # Errors
    ///
    /// Returns an IO error if directory creation fails.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.repo_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> StorePaths {
        StorePaths::new(PathBuf::from("/home/u/.cloudgraph"), "aws", "rdf")
    }

    #[test]
    fn repo_dir() {
        assert_eq!(
            paths().repo_dir(),
            PathBuf::from("/home/u/.cloudgraph/aws/rdf")
        );
    }

    #[test]
    fn git_and_lock_paths() {
        let paths = paths();
        assert_eq!(paths.git_dir(), PathBuf::from("/home/u/.cloudgraph/aws/rdf/.git"));
        assert_eq!(
            paths.lock_path(),
            PathBuf::from("/home/u/.cloudgraph/aws/rdf/.git/cloudgraph/lock")
        );
    }

    #[test]
    fn source_file_layout() {
        let paths = paths();
        let region = Region::new("bali").unwrap();
        let service = ServiceName::new("testservice2").unwrap();
        assert_eq!(
            paths.source_file(&region, &service),
            PathBuf::from("/home/u/.cloudgraph/aws/rdf/bali/testservice2.nt")
        );
        assert_eq!(
            paths.relative_source_file(&region, &service),
            "bali/testservice2.nt"
        );
    }

    #[test]
    fn defaults() {
        let paths = StorePaths::with_defaults(PathBuf::from("/r"));
        assert_eq!(paths.provider(), DEFAULT_PROVIDER);
        assert_eq!(paths.encoding(), DEFAULT_ENCODING);
        assert_eq!(paths.root(), Path::new("/r"));
    }

    #[test]
    fn ensure_dirs_creates_repo_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = StorePaths::with_defaults(temp.path().to_path_buf());
        assert!(!paths.repo_dir().exists());
        paths.ensure_dirs().unwrap();
        assert!(paths.repo_dir().is_dir());
    }
}
