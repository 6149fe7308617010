//! graph::query
//!
//! Declarative filters over resources.
//!
//! A [`Query`] is an immutable value. Every combinator returns a new query
//! and leaves the receiver untouched, so a base query can be shared and
//! refined freely. Property constraints are ANDed; their order does not
//! change what matches.

use std::collections::BTreeSet;
use std::fmt;

use super::resource::Resource;
use super::triple::{vocab, Value};

/// A filter over resources.
///
/// # Example
///
/// ```
/// use cloudgraph::graph::{Query, Resource};
///
/// let web = Resource::builder("instance", "i-1").property("Name", "Web-Front").build();
///
/// let base = Query::new(["instance"]);
/// assert!(base.matches(&web));
/// assert!(!base.property("Name", "web").matches(&web));
/// assert!(base.property("Name", "web").ignore_case().match_string().matches(&web));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    kinds: BTreeSet<String>,
    properties: Vec<(String, Value)>,
    ignore_case: bool,
    match_string: bool,
}

impl Query {
    /// A query over the given kinds. An empty list matches any kind.
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A query matching every resource.
    pub fn any() -> Self {
        Self::default()
    }

    /// Add a property constraint.
    pub fn property(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.properties.push((name.into(), value.into()));
        next
    }

    /// Compare lexical forms case-insensitively.
    pub fn ignore_case(&self) -> Self {
        let mut next = self.clone();
        next.ignore_case = true;
        next
    }

    /// Match when the expected value is a substring of the property.
    pub fn match_string(&self) -> Self {
        let mut next = self.clone();
        next.match_string = true;
        next
    }

    pub fn kinds(&self) -> &BTreeSet<String> {
        &self.kinds
    }

    pub fn constraints(&self) -> &[(String, Value)] {
        &self.properties
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn is_match_string(&self) -> bool {
        self.match_string
    }

    /// Whether resources of `kind` can match.
    pub fn matches_kind(&self, kind: &str) -> bool {
        self.kinds.is_empty() || self.kinds.contains(kind)
    }

    /// The id this query pins with an exact `ID` constraint, if any.
    ///
    /// Stores use it to skip scanning every subject.
    pub fn exact_id(&self) -> Option<&str> {
        if self.ignore_case || self.match_string {
            return None;
        }
        self.properties
            .iter()
            .find(|(name, _)| name == vocab::ID)
            .and_then(|(_, value)| value.as_str())
    }

    /// Whether `resource` satisfies the kind filter and every constraint.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.matches_kind(resource.kind())
            && self.properties.iter().all(|(name, expected)| {
                resource
                    .property(name)
                    .is_some_and(|actual| self.value_matches(actual, expected))
            })
    }

    /// A list property satisfies a constraint if any element does.
    fn value_matches(&self, actual: &Value, expected: &Value) -> bool {
        actual
            .scalars()
            .any(|scalar| self.scalar_matches(scalar, expected))
    }

    fn scalar_matches(&self, actual: &Value, expected: &Value) -> bool {
        if !self.ignore_case && !self.match_string {
            return actual == expected;
        }

        let (mut actual, mut expected) = (actual.to_string(), expected.to_string());
        if self.ignore_case {
            actual = actual.to_lowercase();
            expected = expected.to_lowercase();
        }
        if self.match_string {
            actual.contains(&expected)
        } else {
            actual == expected
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kinds.is_empty() {
            f.write_str("*")?;
        } else {
            let kinds: Vec<&str> = self.kinds.iter().map(String::as_str).collect();
            f.write_str(&kinds.join("|"))?;
        }
        for (name, value) in &self.properties {
            write!(f, " {name}={value}")?;
        }
        if self.ignore_case {
            f.write_str(" (ignore case)")?;
        }
        if self.match_string {
            f.write_str(" (contains)")?;
        }
        Ok(())
    }
}
