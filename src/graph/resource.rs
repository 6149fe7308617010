//! graph::resource
//!
//! A resource is a typed node of the graph: a kind, an id unique within
//! that kind, properties, meta annotations and named relations.
//!
//! Resources decoded from a graph keep a handle to the [`Snapshot`] that
//! produced them, so [`Resource::relations`] answers from the same
//! point-in-time view even if the live graph has moved on.

use std::collections::BTreeMap;
use std::fmt;

use super::store::Snapshot;
use super::triple::{vocab, Value};

/// A node of the resource graph.
#[derive(Clone)]
pub struct Resource {
    kind: String,
    id: String,
    properties: BTreeMap<String, Value>,
    meta: BTreeMap<String, Value>,
    origin: Option<Snapshot>,
}

impl Resource {
    /// Start building a resource of `kind` with `id`.
    ///
    /// # Example
    ///
    /// ```
    /// use cloudgraph::graph::{Resource, Value};
    ///
    /// let inst = Resource::builder("instance", "i-1234")
    ///     .property("Name", "web")
    ///     .property("Cores", 2)
    ///     .meta("diff", "extra")
    ///     .build();
    ///
    /// assert_eq!(inst.property("Name"), Some(&Value::from("web")));
    /// assert_eq!(inst.property("ID"), Some(&Value::from("i-1234")));
    /// assert!(inst.relations("parent_of").is_empty());
    /// ```
    pub fn builder(kind: impl Into<String>, id: impl Into<String>) -> ResourceBuilder {
        ResourceBuilder::new(kind.into(), id.into())
    }

    pub(crate) fn decoded(
        kind: String,
        id: String,
        mut properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
        origin: Snapshot,
    ) -> Self {
        properties.insert(vocab::ID.to_string(), Value::String(id.clone()));
        Self {
            kind,
            id,
            properties,
            meta,
            origin: Some(origin),
        }
    }

    /// The kind tag (resource type).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The id, unique within [`Resource::kind`].
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All properties, including the virtual `ID` property.
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// All meta annotations.
    pub fn metas(&self) -> &BTreeMap<String, Value> {
        &self.meta
    }

    pub fn meta(&self, name: &str) -> Option<&Value> {
        self.meta.get(name)
    }

    /// Resources linked from this one by the relation `name`, ordered by
    /// target id.
    ///
    /// Empty when there are none or when the resource was not decoded from
    /// a graph.
    pub fn relations(&self, name: &str) -> Vec<Resource> {
        match &self.origin {
            Some(snapshot) => snapshot.related(&self.id, &vocab::relation(name)),
            None => Vec::new(),
        }
    }

    /// Identity by business key: same kind and same id.
    pub fn same(&self, other: &Resource) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.same(other) && self.properties == other.properties && self.meta == other.meta
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("properties", &self.properties)
            .field("meta", &self.meta)
            .finish()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.id)
    }
}

/// Builder for resources to insert into a graph.
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    kind: String,
    id: String,
    properties: BTreeMap<String, Value>,
    meta: BTreeMap<String, Value>,
}

impl ResourceBuilder {
    fn new(kind: String, id: String) -> Self {
        Self {
            kind,
            id,
            properties: BTreeMap::new(),
            meta: BTreeMap::new(),
        }
    }

    /// Set a property. Setting `ID` is ignored: the id is fixed.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if name != vocab::ID {
            self.properties.insert(name, value.into());
        }
        self
    }

    pub fn meta(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Resource {
        let mut properties = self.properties;
        properties.insert(vocab::ID.to_string(), Value::String(self.id.clone()));
        Resource {
            kind: self.kind,
            id: self.id,
            properties,
            meta: self.meta,
            origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_never_panic_on_absence() {
        let res = Resource::builder("subnet", "s-1").build();
        assert_eq!(res.property("Missing"), None);
        assert_eq!(res.meta("missing"), None);
        assert!(res.relations("anything").is_empty());
    }

    #[test]
    fn id_is_a_property() {
        let res = Resource::builder("vpc", "vpc-1").property("ID", "other").build();
        assert_eq!(res.property("ID"), Some(&Value::from("vpc-1")));
        assert_eq!(res.properties().len(), 1);
    }

    #[test]
    fn same_compares_kind_and_id_only() {
        let a = Resource::builder("instance", "i-1").property("Name", "a").build();
        let b = Resource::builder("instance", "i-1").property("Name", "b").build();
        let c = Resource::builder("volume", "i-1").build();
        assert!(a.same(&b));
        assert_ne!(a, b);
        assert!(!a.same(&c));
    }

    #[test]
    fn display_shows_kind_and_id() {
        let res = Resource::builder("instance", "i-1").build();
        assert_eq!(res.to_string(), "instance[i-1]");
    }
}
