//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Region`] - Validated cloud region name (e.g. `eu-west-3`)
//! - [`ServiceName`] - Validated sync source name (e.g. `infra`)
//! - [`Oid`] - Git object identifier of a sync commit
//!
//! # Validation
//!
//! Regions and service names become path segments of the sync store
//! (`<region>/<service>.nt`), so they are validated at construction time.
//! A value that could escape its directory cannot be represented.
//!
//! # Examples
//!
//! ```
//! use cloudgraph::core::types::{Oid, Region, ServiceName};
//!
//! let region = Region::new("eu-west-3").unwrap();
//! let service = ServiceName::new("infra").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(region.as_str(), "eu-west-3");
//! assert_eq!(service.as_str(), "infra");
//! assert_eq!(oid.short(7), "abc123d");
//!
//! assert!(Region::new("../etc").is_err());
//! assert!(ServiceName::new("").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("invalid service name: {0}")]
    InvalidServiceName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// Check that `name` is usable as a single path segment of the store.
///
/// Returns a description of the first violated rule.
fn validate_segment(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("cannot be empty".into());
    }
    if name.starts_with('.') {
        return Err("cannot start with '.'".into());
    }
    if name.starts_with('-') {
        return Err("cannot start with '-'".into());
    }
    const INVALID_CHARS: [char; 8] = ['/', '\\', ' ', ':', '*', '?', '<', '>'];
    for c in INVALID_CHARS {
        if name.contains(c) {
            return Err(format!("cannot contain '{c}'"));
        }
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("cannot contain control characters".into());
    }
    Ok(())
}

/// A validated cloud region name.
///
/// # Example
///
/// ```
/// use cloudgraph::core::types::Region;
///
/// let region = Region::new("us-east-1").unwrap();
/// assert_eq!(region.to_string(), "us-east-1");
///
/// assert!(Region::new("").is_err());
/// assert!(Region::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// Create a new validated region.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRegion` if the name is not a safe path segment.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_segment(&name).map_err(|msg| TypeError::InvalidRegion(format!("region {msg}")))?;
        Ok(Self(name))
    }

    /// Get the region as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Region {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

impl AsRef<str> for Region {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated name of a sync source (one provider service).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Create a new validated service name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidServiceName` if the name is not a safe path segment.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_segment(&name)
            .map_err(|msg| TypeError::InvalidServiceName(format!("service name {msg}")))?;
        Ok(Self(name))
    }

    /// Get the service name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use cloudgraph::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters, or the full OID if shorter.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
