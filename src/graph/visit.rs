//! graph::visit
//!
//! Hierarchy traversals.
//!
//! # Architecture
//!
//! A visitor asks the graph for its [`HierarchyTraversable`] capability,
//! takes one [`Snapshot`] and walks a [`Tree`] built over it. Every node
//! reached is re-hydrated into a full [`Resource`] against that same
//! snapshot, so concurrent writes to the live graph never leak into a
//! traversal.
//!
//! # Orders
//!
//! | Visitor | Order | `usize` |
//! |---|---|---|
//! | [`ParentsVisitor`] | start, immediate parent, ..., root | distance from start |
//! | [`ChildrenVisitor`] | DFS pre-order, children by ascending id | depth below start |
//! | [`SiblingsVisitor`] | same-kind children of the parent, ascending id | position in that list |
//!
//! The start resource is reported only when `include_from` is set.
//! Cycles are tolerated: each node is reached at most once.

use std::collections::HashSet;
use std::error::Error;

use super::query::Query;
use super::resource::Resource;
use super::store::Snapshot;
use super::triple::vocab;
use super::{Graph, GraphError};

/// Something that walks a graph.
pub trait Visitor {
    fn visit(&mut self, graph: &dyn Graph) -> Result<(), GraphError>;
}

/// Capability of graphs whose hierarchy can be walked.
pub trait HierarchyTraversable {
    /// A point-in-time view to walk.
    fn snapshot(&self) -> Snapshot;
}

/// Per-node callback of the visitors.
pub type EachFn<'a> = Box<dyn FnMut(&Resource, usize) -> Result<(), GraphError> + 'a>;

/// A callback that appends every visited resource to `out`.
///
/// # Example
///
/// ```
/// use cloudgraph::graph::{collect_into, ChildrenVisitor, Graph, Resource, TripleGraph};
///
/// let graph = TripleGraph::new();
/// let vpc = Resource::builder("vpc", "vpc-1").build();
/// let subnet = Resource::builder("subnet", "sub-1").build();
/// graph.add_resource(&vpc);
/// graph.add_resource(&subnet);
/// graph.add_parent_of(&vpc, &subnet);
///
/// let mut found = Vec::new();
/// let mut visitor = ChildrenVisitor::new(vpc, false, collect_into(&mut found));
/// graph.accept(&mut visitor).unwrap();
/// drop(visitor);
/// assert_eq!(found[0].id(), "sub-1");
/// ```
pub fn collect_into(
    out: &mut Vec<Resource>,
) -> impl FnMut(&Resource, usize) -> Result<(), GraphError> + '_ {
    move |resource, _| {
        out.push(resource.clone());
        Ok(())
    }
}

/// Wrap an arbitrary error raised inside a visitor callback.
pub fn callback_error(err: impl Into<Box<dyn Error + Send + Sync>>) -> GraphError {
    GraphError::Callback(err.into())
}

/// A parent/child tree over one snapshot and one predicate.
///
/// `(parent, predicate, child)` triples are the edges. A node with several
/// parents is attached to the one with the smallest id.
#[derive(Debug, Clone)]
pub struct Tree {
    snapshot: Snapshot,
    predicate: String,
}

impl Tree {
    pub fn new(snapshot: Snapshot, predicate: impl Into<String>) -> Self {
        Self {
            snapshot,
            predicate: predicate.into(),
        }
    }

    /// The hierarchy tree of `snapshot`.
    pub fn hierarchy(snapshot: Snapshot) -> Self {
        Self::new(snapshot, vocab::PARENT_OF)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn parent(&self, node: &str) -> Option<String> {
        self.snapshot
            .node_subjects(&self.predicate, node)
            .first()
            .map(|p| (*p).to_string())
    }

    /// Children of `node`, ascending.
    pub fn children(&self, node: &str) -> Vec<String> {
        self.snapshot
            .node_objects(node, &self.predicate)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Ancestors from the immediate parent up to the root.
    ///
    /// Stops at the first node seen twice.
    pub fn ancestors(&self, node: &str) -> Vec<String> {
        let mut seen = HashSet::from([node.to_string()]);
        let mut out = Vec::new();
        let mut current = node.to_string();
        while let Some(parent) = self.parent(&current) {
            if !seen.insert(parent.clone()) {
                break;
            }
            out.push(parent.clone());
            current = parent;
        }
        out
    }

    /// `node` and its descendants in DFS pre-order with their depth.
    pub fn depth_first(&self, node: &str) -> Vec<(String, usize)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![(node.to_string(), 0usize)];
        while let Some((current, depth)) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for child in self.children(&current).into_iter().rev() {
                if !seen.contains(&child) {
                    stack.push((child, depth + 1));
                }
            }
            out.push((current, depth));
        }
        out
    }
}

/// Shared state and steps of the three visitors.
struct Walk<'a> {
    from: Resource,
    each: EachFn<'a>,
    include_from: bool,
}

impl Walk<'_> {
    fn tree(graph: &dyn Graph) -> Result<Tree, GraphError> {
        let traversable = graph.as_traversable().ok_or_else(|| {
            GraphError::UnsupportedCapability("hierarchy traversal".to_string())
        })?;
        Ok(Tree::hierarchy(traversable.snapshot()))
    }

    /// Load the full resource behind `node` from the walked snapshot.
    fn hydrate(&self, snapshot: &Snapshot, node: &str) -> Result<Resource, GraphError> {
        let kind = if node == self.from.id() {
            self.from.kind().to_string()
        } else {
            snapshot.resolve_kind(node)?
        };
        snapshot.find_one(&Query::new([kind]).property(vocab::ID, node))
    }

    fn emit(&mut self, resource: &Resource, position: usize) -> Result<(), GraphError> {
        if !self.include_from && resource.same(&self.from) {
            return Ok(());
        }
        (self.each)(resource, position)
    }

    fn emit_node(&mut self, tree: &Tree, node: &str, position: usize) -> Result<(), GraphError> {
        let resource = self.hydrate(tree.snapshot(), node)?;
        self.emit(&resource, position)
    }
}

macro_rules! visitor_ctor {
    ($name:ident) => {
        impl<'a> $name<'a> {
            pub fn new(
                from: Resource,
                include_from: bool,
                each: impl FnMut(&Resource, usize) -> Result<(), GraphError> + 'a,
            ) -> Self {
                Self {
                    walk: Walk {
                        from,
                        each: Box::new(each),
                        include_from,
                    },
                }
            }
        }
    };
}

/// Walks from a resource up to the root of its hierarchy.
pub struct ParentsVisitor<'a> {
    walk: Walk<'a>,
}

visitor_ctor!(ParentsVisitor);

impl Visitor for ParentsVisitor<'_> {
    fn visit(&mut self, graph: &dyn Graph) -> Result<(), GraphError> {
        let tree = Walk::tree(graph)?;
        let start = self.walk.from.id().to_string();

        self.walk.emit_node(&tree, &start, 0)?;
        for (distance, node) in tree.ancestors(&start).iter().enumerate() {
            self.walk.emit_node(&tree, node, distance + 1)?;
        }
        Ok(())
    }
}

/// Walks every descendant of a resource.
pub struct ChildrenVisitor<'a> {
    walk: Walk<'a>,
}

visitor_ctor!(ChildrenVisitor);

impl Visitor for ChildrenVisitor<'_> {
    fn visit(&mut self, graph: &dyn Graph) -> Result<(), GraphError> {
        let tree = Walk::tree(graph)?;
        let start = self.walk.from.id().to_string();

        for (node, depth) in tree.depth_first(&start) {
            self.walk.emit_node(&tree, &node, depth)?;
        }
        Ok(())
    }
}

/// Walks the resources sharing a parent and a kind with a resource.
pub struct SiblingsVisitor<'a> {
    walk: Walk<'a>,
}

visitor_ctor!(SiblingsVisitor);

impl Visitor for SiblingsVisitor<'_> {
    fn visit(&mut self, graph: &dyn Graph) -> Result<(), GraphError> {
        let tree = Walk::tree(graph)?;
        let start = self.walk.from.id().to_string();

        let Some(parent) = tree.parent(&start) else {
            return self.walk.emit_node(&tree, &start, 0);
        };

        let kind = self.walk.from.kind().to_string();
        let mut siblings = Vec::new();
        for node in tree.children(&parent) {
            let resource = self.walk.hydrate(tree.snapshot(), &node)?;
            if resource.kind() == kind {
                siblings.push(resource);
            }
        }

        for (position, resource) in siblings.iter().enumerate() {
            self.walk.emit(resource, position)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TripleGraph;

    fn build(edges: &[(&str, &str)], kinds: &[(&str, &str)]) -> TripleGraph {
        let graph = TripleGraph::new();
        for (kind, id) in kinds {
            graph.add_resource(&Resource::builder(*kind, *id).build());
        }
        for (parent, child) in edges {
            graph.add_triple(crate::graph::Triple::parent_of(*parent, *child));
        }
        graph
    }

    #[test]
    fn tree_ancestors_stop_on_cycle() {
        let graph = build(&[("a", "b"), ("b", "c"), ("c", "a")], &[]);
        let tree = Tree::hierarchy(graph.snapshot());
        assert_eq!(tree.ancestors("c"), vec!["b", "a"]);
    }

    #[test]
    fn tree_depth_first_is_preorder_by_id() {
        let graph = build(&[("r", "b"), ("r", "a"), ("a", "a2"), ("a", "a1")], &[]);
        let tree = Tree::hierarchy(graph.snapshot());
        let order: Vec<(String, usize)> = tree.depth_first("r");
        let expected = vec![
            ("r".to_string(), 0),
            ("a".to_string(), 1),
            ("a1".to_string(), 2),
            ("a2".to_string(), 2),
            ("b".to_string(), 1),
        ];
        assert_eq!(order, expected);
    }

    #[test]
    fn tree_depth_first_tolerates_cycle() {
        let graph = build(&[("a", "b"), ("b", "a")], &[]);
        let tree = Tree::hierarchy(graph.snapshot());
        assert_eq!(tree.depth_first("a").len(), 2);
    }

    #[test]
    fn node_without_kind_is_not_found() {
        let graph = build(&[("vpc-1", "ghost")], &[("vpc", "vpc-1")]);
        let vpc = Resource::builder("vpc", "vpc-1").build();
        let mut visitor = ChildrenVisitor::new(vpc, false, |_, _| Ok(()));
        let err = graph.accept(&mut visitor).unwrap_err();
        assert!(matches!(err, GraphError::NotFound { .. }));
    }

    #[test]
    fn callback_error_aborts_walk() {
        let graph = build(
            &[("vpc-1", "s-1"), ("vpc-1", "s-2")],
            &[("vpc", "vpc-1"), ("subnet", "s-1"), ("subnet", "s-2")],
        );
        let vpc = Resource::builder("vpc", "vpc-1").build();
        let mut calls = 0;
        let mut visitor = ChildrenVisitor::new(vpc, false, |_, _| {
            calls += 1;
            Err(callback_error("stop"))
        });
        let err = graph.accept(&mut visitor).unwrap_err();
        drop(visitor);
        assert_eq!(calls, 1);
        assert!(matches!(err, GraphError::Callback(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn siblings_without_parent_yield_only_start() {
        let graph = build(&[], &[("vpc", "vpc-1"), ("vpc", "vpc-2")]);
        let vpc = Resource::builder("vpc", "vpc-1").build();

        let mut found = Vec::new();
        let mut visitor = SiblingsVisitor::new(vpc.clone(), true, collect_into(&mut found));
        graph.accept(&mut visitor).unwrap();
        drop(visitor);
        assert_eq!(found.len(), 1);
        assert!(found[0].same(&vpc));

        let mut found = Vec::new();
        let mut visitor = SiblingsVisitor::new(vpc, false, collect_into(&mut found));
        graph.accept(&mut visitor).unwrap();
        drop(visitor);
        assert!(found.is_empty());
    }

    #[test]
    fn siblings_keep_positions_of_full_list() {
        let graph = build(
            &[("vpc-1", "s-1"), ("vpc-1", "s-2"), ("vpc-1", "s-3"), ("vpc-1", "i-1")],
            &[
                ("vpc", "vpc-1"),
                ("subnet", "s-1"),
                ("subnet", "s-2"),
                ("subnet", "s-3"),
                ("instance", "i-1"),
            ],
        );
        let start = Resource::builder("subnet", "s-2").build();
        let mut seen = Vec::new();
        let mut visitor = SiblingsVisitor::new(start, false, |r: &Resource, i| {
            seen.push((r.id().to_string(), i));
            Ok(())
        });
        graph.accept(&mut visitor).unwrap();
        drop(visitor);
        assert_eq!(seen, vec![("s-1".to_string(), 0), ("s-3".to_string(), 2)]);
    }
}
