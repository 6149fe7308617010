//! graph::store
//!
//! The triple-backed graph.
//!
//! # Architecture
//!
//! - [`TripleIndex`] holds the triples, indexed subject → predicate →
//!   objects plus a reverse node → predicate → subjects map.
//! - [`Snapshot`] is an `Arc<TripleIndex>`: immutable, O(1) to clone, and
//!   itself a complete [`Graph`].
//! - [`TripleGraph`] is the live store. Writers go through
//!   `Arc::make_mut`, so a snapshot taken before a write never observes it.
//!
//! # Invariants
//!
//! - Every snapshot sees exactly the triples present when it was taken
//! - Iteration order is (subject, predicate, object), so queries and
//!   marshalling are deterministic
//! - Properties and meta belong to a (kind, id) pair: resources of
//!   different kinds sharing an id never see each other's values

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};
use std::sync::Arc;

use parking_lot::RwLock;

use super::codec;
use super::query::Query;
use super::resource::Resource;
use super::triple::{vocab, Literal, Object, Triple, Value};
use super::visit::{HierarchyTraversable, Visitor};
use super::{Graph, GraphError, SharedGraph};

/// Indexed set of triples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripleIndex {
    spo: BTreeMap<String, BTreeMap<String, BTreeSet<Object>>>,
    ops: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    len: usize,
}

impl TripleIndex {
    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;

        if let Object::Node(node) = &object {
            self.ops
                .entry(node.clone())
                .or_default()
                .entry(predicate.clone())
                .or_default()
                .insert(subject.clone());
        }

        let inserted = self
            .spo
            .entry(subject)
            .or_default()
            .entry(predicate)
            .or_default()
            .insert(object);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Remove a triple. Returns `false` if it was absent.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        let Some(predicates) = self.spo.get_mut(&triple.subject) else {
            return false;
        };
        let Some(objects) = predicates.get_mut(&triple.predicate) else {
            return false;
        };
        if !objects.remove(&triple.object) {
            return false;
        }
        if objects.is_empty() {
            predicates.remove(&triple.predicate);
        }
        if predicates.is_empty() {
            self.spo.remove(&triple.subject);
        }

        if let Object::Node(node) = &triple.object {
            if let Some(by_pred) = self.ops.get_mut(node) {
                if let Some(subjects) = by_pred.get_mut(&triple.predicate) {
                    subjects.remove(&triple.subject);
                    if subjects.is_empty() {
                        by_pred.remove(&triple.predicate);
                    }
                }
                if by_pred.is_empty() {
                    self.ops.remove(node);
                }
            }
        }

        self.len -= 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.spo
            .get(&triple.subject)
            .and_then(|p| p.get(&triple.predicate))
            .is_some_and(|o| o.contains(&triple.object))
    }

    /// All triples in (subject, predicate, object) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Object)> + '_ {
        self.spo.iter().flat_map(|(s, preds)| {
            preds.iter().flat_map(move |(p, objects)| {
                objects.iter().map(move |o| (s.as_str(), p.as_str(), o))
            })
        })
    }

    /// Every subject, ascending.
    pub fn subjects(&self) -> impl Iterator<Item = &str> + '_ {
        self.spo.keys().map(String::as_str)
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects(&self, subject: &str, predicate: &str) -> impl Iterator<Item = &Object> + '_ {
        self.spo
            .get(subject)
            .and_then(|p| p.get(predicate))
            .into_iter()
            .flatten()
    }

    /// Subjects of `(?, predicate, Node(node))`.
    pub fn subjects_pointing_to(
        &self,
        predicate: &str,
        node: &str,
    ) -> impl Iterator<Item = &str> + '_ {
        self.ops
            .get(node)
            .and_then(|p| p.get(predicate))
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    fn predicates(&self, subject: &str) -> Option<&BTreeMap<String, BTreeSet<Object>>> {
        self.spo.get(subject)
    }
}

impl FromIterator<Triple> for TripleIndex {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut index = TripleIndex::default();
        for triple in iter {
            index.insert(triple);
        }
        index
    }
}

/// An immutable point-in-time view of a triple store.
///
/// Traversals take one snapshot up front and resolve every step against
/// it, so a concurrent rebuild of the live graph cannot disturb them.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    index: Arc<TripleIndex>,
}

impl Snapshot {
    pub fn new(index: TripleIndex) -> Self {
        Self {
            index: Arc::new(index),
        }
    }

    pub fn index(&self) -> &TripleIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All triples, owned, in canonical order.
    pub fn triples(&self) -> Vec<Triple> {
        self.index
            .iter()
            .map(|(s, p, o)| Triple::new(s, p, o.clone()))
            .collect()
    }

    /// Kind tags declared for `node`.
    pub fn kinds_of(&self, node: &str) -> Vec<&str> {
        self.index
            .objects(node, vocab::RDF_TYPE)
            .filter_map(|o| o.as_literal().map(|l| l.lexical.as_str()))
            .collect()
    }

    /// Resolve the single kind of a bare node id.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotFound`] if the node has no kind
    /// - [`GraphError::Ambiguous`] if it has more than one
    pub fn resolve_kind(&self, node: &str) -> Result<String, GraphError> {
        let kinds = self.kinds_of(node);
        match kinds.as_slice() {
            [kind] => Ok((*kind).to_string()),
            [] => Err(GraphError::NotFound {
                query: format!("kind of node {node}"),
            }),
            many => Err(GraphError::Ambiguous {
                query: format!("kind of node {node}"),
                count: many.len(),
            }),
        }
    }

    /// Node ids reachable from `subject` through `predicate`, ascending.
    pub fn node_objects(&self, subject: &str, predicate: &str) -> Vec<&str> {
        self.index
            .objects(subject, predicate)
            .filter_map(Object::as_node)
            .collect()
    }

    /// Subjects linking to `node` through `predicate`, ascending.
    pub fn node_subjects(&self, predicate: &str, node: &str) -> Vec<&str> {
        self.index.subjects_pointing_to(predicate, node).collect()
    }

    /// Decode `subject` as a resource of `kind`.
    fn decode(&self, subject: &str, kind: &str) -> Resource {
        let mut properties: BTreeMap<String, Vec<&Literal>> = BTreeMap::new();
        let mut meta: BTreeMap<String, Vec<&Literal>> = BTreeMap::new();

        for (predicate, objects) in self.index.predicates(subject).into_iter().flatten() {
            let target = if let Some(name) = vocab::scoped_name(predicate, vocab::PROPERTY_NS, kind) {
                properties.entry(name.to_string()).or_default()
            } else if let Some(name) = vocab::scoped_name(predicate, vocab::META_NS, kind) {
                meta.entry(name.to_string()).or_default()
            } else {
                continue;
            };
            target.extend(objects.iter().filter_map(Object::as_literal));
        }

        Resource::decoded(
            kind.to_string(),
            subject.to_string(),
            collapse(properties),
            collapse(meta),
            self.clone(),
        )
    }

    /// Every resource decoded from `node` (one per declared kind).
    fn decode_all(&self, node: &str) -> Vec<Resource> {
        self.kinds_of(node)
            .into_iter()
            .map(|kind| self.decode(node, kind))
            .collect()
    }

    /// Resources related to `subject` by `predicate`, ordered by id.
    pub(crate) fn related(&self, subject: &str, predicate: &str) -> Vec<Resource> {
        self.node_objects(subject, predicate)
            .into_iter()
            .flat_map(|node| self.decode_all(node))
            .collect()
    }

    fn find_matching(&self, query: &Query) -> Vec<Resource> {
        let candidates: Vec<&str> = match query.exact_id() {
            Some(id) => self.index.subjects().filter(|s| *s == id).collect(),
            None => self.index.subjects().collect(),
        };

        let mut found: Vec<Resource> = candidates
            .into_iter()
            .flat_map(|subject| {
                self.kinds_of(subject)
                    .into_iter()
                    .filter(|kind| query.matches_kind(kind))
                    .map(move |kind| (subject, kind))
            })
            .map(|(subject, kind)| self.decode(subject, kind))
            .filter(|resource| query.matches(resource))
            .collect();

        found.sort_by(|a, b| a.kind().cmp(b.kind()).then_with(|| a.id().cmp(b.id())));
        found
    }

    /// Triples of the matching subgraph: the kind, properties and meta of
    /// every match, plus node links between matched ids.
    fn filtered(&self, query: &Query) -> TripleIndex {
        let mut kept: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for resource in self.find_matching(query) {
            kept.entry(resource.id().to_string())
                .or_default()
                .insert(resource.kind().to_string());
        }

        self.index
            .iter()
            .filter(|(s, p, o)| {
                let Some(kinds) = kept.get(*s) else {
                    return false;
                };
                match o {
                    Object::Node(node) => kept.contains_key(node.as_str()),
                    Object::Literal(lit) if *p == vocab::RDF_TYPE => kinds.contains(&lit.lexical),
                    Object::Literal(_) => kinds.iter().any(|kind| vocab::belongs_to(p, kind)),
                }
            })
            .map(|(s, p, o)| Triple::new(s, p, o.clone()))
            .collect()
    }
}

/// Fold the literals of each name into one value; several become a list.
fn collapse(grouped: BTreeMap<String, Vec<&Literal>>) -> BTreeMap<String, Value> {
    grouped
        .into_iter()
        .filter(|(_, literals)| !literals.is_empty())
        .map(|(name, literals)| {
            let value = match literals.as_slice() {
                [single] => single.to_value(),
                many => Value::List(many.iter().map(|l| l.to_value()).collect()),
            };
            (name, value)
        })
        .collect()
}

/// Return the single match or a cardinality error.
pub(crate) fn exactly_one(mut found: Vec<Resource>, query: &Query) -> Result<Resource, GraphError> {
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(GraphError::NotFound {
            query: query.to_string(),
        }),
        count => Err(GraphError::Ambiguous {
            query: query.to_string(),
            count,
        }),
    }
}

impl Graph for Snapshot {
    fn find(&self, query: &Query) -> Result<Vec<Resource>, GraphError> {
        Ok(self.find_matching(query))
    }

    fn find_one(&self, query: &Query) -> Result<Resource, GraphError> {
        exactly_one(self.find_matching(query), query)
    }

    fn filter_graph(&self, query: &Query) -> Result<SharedGraph, GraphError> {
        Ok(Arc::new(TripleGraph::from_index(self.filtered(query))))
    }

    fn accept(&self, visitor: &mut dyn Visitor) -> Result<(), GraphError> {
        visitor.visit(self)
    }

    fn marshal_to(&self, writer: &mut dyn Write) -> Result<(), GraphError> {
        codec::write_triples(self.index.iter(), writer)?;
        Ok(())
    }

    fn as_traversable(&self) -> Option<&dyn HierarchyTraversable> {
        Some(self)
    }
}

impl HierarchyTraversable for Snapshot {
    fn snapshot(&self) -> Snapshot {
        self.clone()
    }
}

/// The live, mutable triple-backed graph.
///
/// # Example
///
/// ```
/// use cloudgraph::graph::{Graph, Query, Resource, TripleGraph};
///
/// let graph = TripleGraph::new();
/// let vpc = Resource::builder("vpc", "vpc-1").property("Name", "main").build();
/// let subnet = Resource::builder("subnet", "sub-1").build();
/// graph.add_resource(&vpc);
/// graph.add_resource(&subnet);
/// graph.add_parent_of(&vpc, &subnet);
///
/// let found = graph.find_one(&Query::new(["vpc"]).property("Name", "main")).unwrap();
/// assert!(found.same(&vpc));
/// assert_eq!(found.relations("parent_of")[0].id(), "sub-1");
/// ```
#[derive(Debug, Default)]
pub struct TripleGraph {
    index: RwLock<Arc<TripleIndex>>,
}

impl TripleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_index(index: TripleIndex) -> Self {
        Self {
            index: RwLock::new(Arc::new(index)),
        }
    }

    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        Self::from_index(triples.into_iter().collect())
    }

    /// Decode a graph from the native encoding.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, GraphError> {
        Ok(Self::from_triples(codec::read_triples(reader)?))
    }

    /// Take an immutable view of the current content.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            index: Arc::clone(&self.index.read()),
        }
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn add_triple(&self, triple: Triple) -> bool {
        let mut guard = self.index.write();
        Arc::make_mut(&mut guard).insert(triple)
    }

    pub fn add_triples(&self, triples: impl IntoIterator<Item = Triple>) {
        let mut guard = self.index.write();
        let index = Arc::make_mut(&mut guard);
        for triple in triples {
            index.insert(triple);
        }
    }

    pub fn remove_triple(&self, triple: &Triple) -> bool {
        let mut guard = self.index.write();
        Arc::make_mut(&mut guard).remove(triple)
    }

    /// Insert the kind, properties and meta of `resource`.
    pub fn add_resource(&self, resource: &Resource) {
        self.add_triples(resource_triples(resource));
    }

    /// Link `from` to `to` with the relation `name`.
    pub fn add_relation(&self, from: &Resource, name: &str, to: &Resource) {
        self.add_triple(Triple::new(
            from.id(),
            vocab::relation(name),
            Object::node(to.id()),
        ));
    }

    /// Declare `parent` as the hierarchy parent of `child`.
    pub fn add_parent_of(&self, parent: &Resource, child: &Resource) {
        self.add_triple(Triple::parent_of(parent.id(), child.id()));
    }

    /// Insert every triple of `other`.
    pub fn merge(&self, other: &Snapshot) {
        self.add_triples(other.triples());
    }
}

/// Triples describing a resource (without its relations).
fn resource_triples(resource: &Resource) -> Vec<Triple> {
    let id = resource.id();
    let kind = resource.kind();
    let mut triples = vec![Triple::new(
        id,
        vocab::RDF_TYPE,
        Object::Literal(Literal::string(kind)),
    )];

    for (name, value) in resource.properties() {
        if name == vocab::ID {
            continue;
        }
        let predicate = vocab::property(kind, name);
        triples.extend(
            value
                .to_literals()
                .into_iter()
                .map(|lit| Triple::new(id, predicate.clone(), Object::Literal(lit))),
        );
    }

    for (name, value) in resource.metas() {
        let predicate = vocab::meta(kind, name);
        triples.extend(
            value
                .to_literals()
                .into_iter()
                .map(|lit| Triple::new(id, predicate.clone(), Object::Literal(lit))),
        );
    }

    triples
}

impl Graph for TripleGraph {
    fn find(&self, query: &Query) -> Result<Vec<Resource>, GraphError> {
        self.snapshot().find(query)
    }

    fn find_one(&self, query: &Query) -> Result<Resource, GraphError> {
        self.snapshot().find_one(query)
    }

    fn filter_graph(&self, query: &Query) -> Result<SharedGraph, GraphError> {
        self.snapshot().filter_graph(query)
    }

    fn accept(&self, visitor: &mut dyn Visitor) -> Result<(), GraphError> {
        visitor.visit(self)
    }

    fn marshal_to(&self, writer: &mut dyn Write) -> Result<(), GraphError> {
        self.snapshot().marshal_to(writer)
    }

    fn as_traversable(&self) -> Option<&dyn HierarchyTraversable> {
        Some(self)
    }
}

impl HierarchyTraversable for TripleGraph {
    fn snapshot(&self) -> Snapshot {
        TripleGraph::snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TripleGraph {
        let graph = TripleGraph::new();
        let region = Resource::builder("region", "eu-west-1").build();
        let vpc = Resource::builder("vpc", "vpc-1").property("Name", "Main").build();
        let web = Resource::builder("instance", "i-web")
            .property("Name", "web-1")
            .property("State", "running")
            .meta("source", "infra")
            .build();
        let db = Resource::builder("instance", "i-db")
            .property("Name", "db-1")
            .property("State", "running")
            .build();
        for res in [&region, &vpc, &web, &db] {
            graph.add_resource(res);
        }
        graph.add_parent_of(&region, &vpc);
        graph.add_parent_of(&vpc, &web);
        graph.add_parent_of(&vpc, &db);
        graph.add_relation(&web, "applies_on", &db);
        graph
    }

    #[test]
    fn index_insert_is_idempotent() {
        let mut index = TripleIndex::default();
        let t = Triple::parent_of("a", "b");
        assert!(index.insert(t.clone()));
        assert!(!index.insert(t.clone()));
        assert_eq!(index.len(), 1);
        assert!(index.contains(&t));
    }

    #[test]
    fn index_remove_cleans_reverse_map() {
        let mut index = TripleIndex::default();
        let t = Triple::parent_of("a", "b");
        index.insert(t.clone());
        assert!(index.remove(&t));
        assert!(!index.remove(&t));
        assert!(index.is_empty());
        assert_eq!(index.subjects_pointing_to(vocab::PARENT_OF, "b").count(), 0);
        assert_eq!(index, TripleIndex::default());
    }

    #[test]
    fn find_by_kind_sorted_by_id() {
        let graph = sample();
        let found = graph.find(&Query::new(["instance"])).unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["i-db", "i-web"]);
    }

    #[test]
    fn find_with_empty_kinds_spans_all_kinds() {
        let graph = sample();
        let found = graph.find(&Query::any().property("Name", "1").match_string()).unwrap();
        let keys: Vec<(&str, &str)> = found.iter().map(|r| (r.kind(), r.id())).collect();
        assert_eq!(keys, vec![("instance", "i-db"), ("instance", "i-web")]);

        let all = graph.find(&Query::any()).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn find_one_cardinality() {
        let graph = sample();
        let err = graph.find_one(&Query::new(["volume"])).unwrap_err();
        assert!(matches!(err, GraphError::NotFound { .. }));

        let err = graph
            .find_one(&Query::new(["instance"]).property("State", "running"))
            .unwrap_err();
        assert!(matches!(err, GraphError::Ambiguous { count: 2, .. }));

        let one = graph
            .find_one(&Query::new(["instance"]).property("ID", "i-web"))
            .unwrap();
        assert_eq!(one.meta("source"), Some(&Value::from("infra")));
    }

    #[test]
    fn relations_follow_named_predicate() {
        let graph = sample();
        let vpc = graph.find_one(&Query::new(["vpc"])).unwrap();
        let children: Vec<String> = vpc
            .relations(vocab::PARENT_OF_NAME)
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(children, vec!["i-db", "i-web"]);

        let web = graph
            .find_one(&Query::new(["instance"]).property("ID", "i-web"))
            .unwrap();
        assert_eq!(web.relations("applies_on")[0].id(), "i-db");
        assert!(web.relations("unknown").is_empty());
    }

    #[test]
    fn multi_valued_property_decodes_as_list() {
        let graph = TripleGraph::new();
        let res = Resource::builder("group", "g-1")
            .property("Members", vec!["alice", "bob"])
            .build();
        graph.add_resource(&res);
        let found = graph.find_one(&Query::new(["group"])).unwrap();
        assert_eq!(
            found.property("Members"),
            Some(&Value::from(vec!["alice", "bob"]))
        );
        assert_eq!(found, res);
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let graph = sample();
        let before = graph.snapshot();
        let count = before.len();

        graph.add_resource(&Resource::builder("volume", "vol-1").build());
        graph.remove_triple(&Triple::parent_of("vpc-1", "i-db"));

        assert_eq!(before.len(), count);
        assert!(before.find_one(&Query::new(["volume"])).is_err());
        assert_eq!(before.node_objects("vpc-1", vocab::PARENT_OF), vec!["i-db", "i-web"]);
        assert_eq!(graph.snapshot().node_objects("vpc-1", vocab::PARENT_OF), vec!["i-web"]);
    }

    #[test]
    fn filter_graph_keeps_matching_subgraph() {
        let graph = sample();
        let filtered = graph.filter_graph(&Query::new(["instance"])).unwrap();

        assert_eq!(filtered.find(&Query::any()).unwrap().len(), 2);
        let web = filtered
            .find_one(&Query::new(["instance"]).property("ID", "i-web"))
            .unwrap();
        assert_eq!(web.relations("applies_on").len(), 1);

        // receiver untouched
        assert_eq!(graph.find(&Query::any()).unwrap().len(), 4);
    }

    #[test]
    fn filter_graph_drops_links_to_excluded_nodes() {
        let graph = sample();
        let filtered = graph.filter_graph(&Query::new(["vpc"])).unwrap();
        let vpc = filtered.find_one(&Query::new(["vpc"])).unwrap();
        assert!(vpc.relations(vocab::PARENT_OF_NAME).is_empty());
    }

    #[test]
    fn shared_id_across_kinds_keeps_properties_apart() {
        let graph = TripleGraph::new();
        let instance = Resource::builder("instance", "x-1")
            .property("State", "running")
            .meta("source", "compute")
            .build();
        let volume = Resource::builder("volume", "x-1").property("Size", 8).build();
        graph.add_resource(&instance);
        graph.add_resource(&volume);

        let found = graph
            .find_one(&Query::new(["volume"]).property("ID", "x-1"))
            .unwrap();
        assert_eq!(found, volume);
        assert_eq!(found.property("State"), None);
        assert_eq!(found.meta("source"), None);

        let found = graph
            .find_one(&Query::new(["instance"]).property("ID", "x-1"))
            .unwrap();
        assert_eq!(found, instance);
        assert_eq!(found.property("Size"), None);

        assert!(graph
            .find(&Query::new(["volume"]).property("State", "running"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn filter_graph_drops_other_kinds_on_a_shared_id() {
        let graph = TripleGraph::new();
        graph.add_resource(&Resource::builder("instance", "x-1").property("State", "running").build());
        graph.add_resource(&Resource::builder("volume", "x-1").property("Size", 8).build());

        let filtered = graph.filter_graph(&Query::new(["volume"])).unwrap();
        let all = filtered.find(&Query::any()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind(), "volume");
        assert_eq!(all[0].property("State"), None);
    }

    #[test]
    fn resolve_kind_errors() {
        let graph = sample();
        let snap = graph.snapshot();
        assert_eq!(snap.resolve_kind("vpc-1").unwrap(), "vpc");
        assert!(matches!(
            snap.resolve_kind("nope"),
            Err(GraphError::NotFound { .. })
        ));

        graph.add_resource(&Resource::builder("subnet", "vpc-1").build());
        assert!(matches!(
            graph.snapshot().resolve_kind("vpc-1"),
            Err(GraphError::Ambiguous { count: 2, .. })
        ));
    }

    #[test]
    fn merge_unions_triples() {
        let a = sample();
        let b = TripleGraph::new();
        b.add_resource(&Resource::builder("volume", "vol-1").build());
        let before = a.len();
        a.merge(&b.snapshot());
        assert_eq!(a.len(), before + 1);
    }
}
