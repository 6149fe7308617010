//! graph::triple
//!
//! The atoms of the store: subject/predicate/object triples, literal
//! values, and the vocabulary that maps resources onto triples.
//!
//! # Vocabulary
//!
//! | Predicate | Object | Meaning |
//! |---|---|---|
//! | `rdf:type` | literal | resource kind |
//! | `cloud:<kind>/<Name>` | literal | property |
//! | `meta:<kind>/<name>` | literal | out-of-band annotation |
//! | `rel:<name>` | node | relation to another resource |
//!
//! Ids are only unique within a kind, so property and meta predicates
//! carry the kind of the resource they describe. Two resources sharing
//! an id share a subject but never each other's properties.
//!
//! The hierarchy is the relation [`vocab::PARENT_OF`]: the subject is the
//! parent, the object the child.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Predicate names and namespace helpers.
pub mod vocab {
    /// Kind of a resource.
    pub const RDF_TYPE: &str = "rdf:type";
    /// Namespace of property predicates.
    pub const PROPERTY_NS: &str = "cloud:";
    /// Namespace of meta predicates.
    pub const META_NS: &str = "meta:";
    /// Namespace of relation predicates.
    pub const RELATION_NS: &str = "rel:";
    /// The hierarchy predicate.
    pub const PARENT_OF: &str = "rel:parent_of";
    /// Relation name of [`PARENT_OF`] without its namespace.
    pub const PARENT_OF_NAME: &str = "parent_of";
    /// Virtual property carrying a resource id.
    pub const ID: &str = "ID";

    pub fn property(kind: &str, name: &str) -> String {
        format!("{PROPERTY_NS}{kind}/{name}")
    }

    pub fn meta(kind: &str, name: &str) -> String {
        format!("{META_NS}{kind}/{name}")
    }

    /// Name carried by `predicate` if it lives in `ns` and is scoped to `kind`.
    pub fn scoped_name<'a>(predicate: &'a str, ns: &str, kind: &str) -> Option<&'a str> {
        predicate
            .strip_prefix(ns)?
            .strip_prefix(kind)?
            .strip_prefix('/')
    }

    /// Whether `predicate` describes a resource of `kind`.
    pub fn belongs_to(predicate: &str, kind: &str) -> bool {
        scoped_name(predicate, PROPERTY_NS, kind).is_some()
            || scoped_name(predicate, META_NS, kind).is_some()
    }

    pub fn relation(name: &str) -> String {
        format!("{RELATION_NS}{name}")
    }
}

/// Datatype of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Datatype {
    String,
    Int,
    Double,
    Boolean,
    DateTime,
}

impl Datatype {
    /// Prefixed name used by the codec.
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::String => "xsd:string",
            Datatype::Int => "xsd:int",
            Datatype::Double => "xsd:double",
            Datatype::Boolean => "xsd:boolean",
            Datatype::DateTime => "xsd:dateTime",
        }
    }

    /// Parse a prefixed datatype name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "xsd:string" => Some(Datatype::String),
            "xsd:int" => Some(Datatype::Int),
            "xsd:double" => Some(Datatype::Double),
            "xsd:boolean" => Some(Datatype::Boolean),
            "xsd:dateTime" => Some(Datatype::DateTime),
            _ => None,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed literal in lexical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Datatype,
}

impl Literal {
    pub fn new(lexical: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
        }
    }

    pub fn string(lexical: impl Into<String>) -> Self {
        Self::new(lexical, Datatype::String)
    }

    /// Decode into a [`Value`].
    ///
    /// A lexical form that does not parse as its datatype decodes as a
    /// string rather than failing.
    pub fn to_value(&self) -> Value {
        let parsed = match self.datatype {
            Datatype::String => None,
            Datatype::Int => self.lexical.parse().ok().map(Value::Int),
            Datatype::Double => self.lexical.parse().ok().map(Value::Float),
            Datatype::Boolean => self.lexical.parse().ok().map(Value::Bool),
            Datatype::DateTime => DateTime::parse_from_rfc3339(&self.lexical)
                .ok()
                .map(|t| Value::Time(t.with_timezone(&Utc))),
        };
        parsed.unwrap_or_else(|| Value::String(self.lexical.clone()))
    }
}

/// The object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Object {
    /// Reference to another subject.
    Node(String),
    /// A literal value.
    Literal(Literal),
}

impl Object {
    pub fn node(id: impl Into<String>) -> Self {
        Object::Node(id.into())
    }

    pub fn as_node(&self) -> Option<&str> {
        match self {
            Object::Node(id) => Some(id),
            Object::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Object::Node(_) => None,
            Object::Literal(lit) => Some(lit),
        }
    }
}

/// A (subject, predicate, object) record.
///
/// Ordering is lexicographic on (subject, predicate, object), which is the
/// order the codec writes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Object,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Object) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }

    /// `(subject, PARENT_OF, child)`.
    pub fn parent_of(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self::new(parent, vocab::PARENT_OF, Object::Node(child.into()))
    }
}

/// A property or meta value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    List(Vec<Value>),
}

impl Value {
    /// Encode a scalar as one literal, or a list as one literal per element.
    pub fn to_literals(&self) -> Vec<Literal> {
        match self {
            Value::String(s) => vec![Literal::string(s.clone())],
            Value::Int(i) => vec![Literal::new(i.to_string(), Datatype::Int)],
            Value::Float(v) => vec![Literal::new(v.to_string(), Datatype::Double)],
            Value::Bool(b) => vec![Literal::new(b.to_string(), Datatype::Boolean)],
            Value::Time(t) => vec![Literal::new(
                t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                Datatype::DateTime,
            )],
            Value::List(items) => items.iter().flat_map(Value::to_literals).collect(),
        }
    }

    /// Iterate the scalars of this value (the value itself unless a list).
    pub fn scalars(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Value::List(items) => Box::new(items.iter().flat_map(Value::scalars)),
            other => Box::new(std::iter::once(other)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
