//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! cloudgraph has one configuration scope, the user config file. Loading
//! it is the only place the process environment is consulted; the result
//! is resolved into an explicit [`SyncSettings`] value that is handed to
//! the sync engine, so several engines can run against independent roots.
//!
//! # Precedence
//!
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$CLOUDGRAPH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cloudgraph/config.toml`
//! 3. `~/.cloudgraph/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use cloudgraph::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let settings = config.sync_settings().unwrap();
//! println!("store root: {}", settings.paths.root().display());
//! ```

pub mod schema;

pub use schema::{AuthorConfig, CommitPolicy, GlobalConfig, SyncDefaults};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::{StorePaths, DEFAULT_ENCODING, DEFAULT_PROVIDER};

/// Default number of concurrent source fetches.
pub const DEFAULT_WORKERS: usize = 8;

/// Default per-source fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Default commit author.
pub const DEFAULT_AUTHOR_NAME: &str = "cloudgraph";
pub const DEFAULT_AUTHOR_EMAIL: &str = "cloudgraph@localhost";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Fully resolved settings for one sync engine.
///
/// Construct directly in tests or embedders; the CLI builds it from
/// [`Config::sync_settings`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Store layout
    pub paths: StorePaths,
    /// Maximum number of concurrent fetches
    pub workers: usize,
    /// Per-source fetch timeout
    pub fetch_timeout: Duration,
    /// Behaviour on partial failure
    pub commit_policy: CommitPolicy,
    /// Commit author name
    pub author_name: String,
    /// Commit author email
    pub author_email: String,
}

impl SyncSettings {
    /// Settings with defaults for a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: StorePaths::with_defaults(root.into()),
            workers: DEFAULT_WORKERS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            commit_policy: CommitPolicy::default(),
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }

    /// Override the worker count (clamped to at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Override the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Override the commit policy.
    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed config file (defaults if none was found)
    pub global: GlobalConfig,
    /// Path the config was loaded from, if any
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::discover() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let global: GlobalConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        global.validate()?;

        Ok(Self {
            global,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file.
    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CLOUDGRAPH_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("cloudgraph/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        Self::global_config_path().ok().filter(|p| p.exists())
    }

    /// Canonical config path: `~/.cloudgraph/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".cloudgraph/config.toml"))
    }

    /// Default store root: `~/.cloudgraph`.
    pub fn default_home() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".cloudgraph"))
    }

    /// Write a config file atomically (temp file, then rename).
    pub fn write_to(path: &Path, config: &GlobalConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;
        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Path the config was loaded from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Provider directory name. Defaults to `aws`.
    pub fn provider(&self) -> &str {
        self.global.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Encoding directory name. Defaults to `rdf`.
    pub fn encoding(&self) -> &str {
        self.global.encoding.as_deref().unwrap_or(DEFAULT_ENCODING)
    }

    /// Concurrent fetch limit. Defaults to [`DEFAULT_WORKERS`].
    pub fn workers(&self) -> usize {
        self.global
            .sync
            .as_ref()
            .and_then(|s| s.workers)
            .unwrap_or(DEFAULT_WORKERS)
    }

    /// Per-source fetch timeout. Defaults to [`DEFAULT_FETCH_TIMEOUT`].
    pub fn fetch_timeout(&self) -> Duration {
        self.global
            .sync
            .as_ref()
            .and_then(|s| s.fetch_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT)
    }

    /// Commit policy. Defaults to [`CommitPolicy::Succeeded`].
    pub fn commit_policy(&self) -> CommitPolicy {
        self.global
            .sync
            .as_ref()
            .and_then(|s| s.commit_policy)
            .unwrap_or_default()
    }

    /// Resolve the store root: configured `home`, else `~/.cloudgraph`.
    pub fn home(&self) -> Result<PathBuf, ConfigError> {
        match &self.global.home {
            Some(home) => Ok(home.clone()),
            None => Self::default_home(),
        }
    }

    /// Resolve everything a [`crate::sync::Syncer`] needs.
    pub fn sync_settings(&self) -> Result<SyncSettings, ConfigError> {
        let author = self.global.author.clone().unwrap_or_default();
        Ok(SyncSettings {
            paths: StorePaths::new(self.home()?, self.provider(), self.encoding()),
            workers: self.workers(),
            fetch_timeout: self.fetch_timeout(),
            commit_policy: self.commit_policy(),
            author_name: author
                .name
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            author_email: author
                .email
                .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string()),
        })
    }
}
