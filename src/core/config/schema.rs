//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$CLOUDGRAPH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cloudgraph/config.toml`
//! 3. `~/.cloudgraph/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Values are validated after parsing: counts must be positive and the
//! provider/encoding directory names must be plain path segments.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// What a sync run commits when some sources fail.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// Commit the files of every source that succeeded.
    #[default]
    Succeeded,
    /// Withhold the commit unless every enabled source succeeded.
    AllOrNothing,
}

impl std::fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitPolicy::Succeeded => write!(f, "succeeded"),
            CommitPolicy::AllOrNothing => write!(f, "all-or-nothing"),
        }
    }
}

/// User configuration.
///
/// # Example
///
/// ```toml
/// home = "/var/lib/cloudgraph"
/// provider = "aws"
///
/// [sync]
/// workers = 4
/// fetch_timeout_secs = 30
/// commit_policy = "all-or-nothing"
///
/// [author]
/// name = "sync-bot"
/// email = "sync-bot@example.com"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Store root directory (default: `~/.cloudgraph`)
    pub home: Option<PathBuf>,

    /// Provider directory name (default: `aws`)
    pub provider: Option<String>,

    /// Encoding directory name (default: `rdf`)
    pub encoding: Option<String>,

    /// Sync engine tuning
    pub sync: Option<SyncDefaults>,

    /// Commit author for sync revisions
    pub author: Option<AuthorConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("provider", &self.provider), ("encoding", &self.encoding)] {
            if let Some(value) = value {
                if value.is_empty()
                    || value.starts_with('.')
                    || value.contains('/')
                    || value.contains('\\')
                {
                    return Err(ConfigError::InvalidValue(format!(
                        "{field} must be a plain directory name, got '{value}'"
                    )));
                }
            }
        }

        if let Some(sync) = &self.sync {
            sync.validate()?;
        }

        if let Some(author) = &self.author {
            author.validate()?;
        }

        Ok(())
    }
}

/// Sync engine defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncDefaults {
    /// Maximum number of concurrent source fetches
    pub workers: Option<usize>,

    /// Per-source fetch timeout in seconds
    pub fetch_timeout_secs: Option<u64>,

    /// Behaviour on partial failure
    pub commit_policy: Option<CommitPolicy>,
}

impl SyncDefaults {
    /// Validate the sync section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sync.workers must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sync.fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Commit author identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AuthorConfig {
    /// Validate the author section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "author.name cannot be empty".to_string(),
                ));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ConfigError::InvalidValue(format!(
                    "author.email '{email}' is not an email address"
                )));
            }
        }
        Ok(())
    }
}
