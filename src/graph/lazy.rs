//! graph::lazy
//!
//! A graph whose content is produced on first use.
//!
//! [`LazyGraph`] wraps a loader and runs it exactly once, no matter how
//! many threads race on the first call. Late arrivals block until the
//! load finishes and then share the same loaded graph.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;

use tracing::debug;

use super::query::Query;
use super::resource::Resource;
use super::visit::{HierarchyTraversable, Visitor};
use super::{Graph, GraphError, SharedGraph};

type Loader = Box<dyn Fn() -> SharedGraph + Send + Sync>;

/// Decorator deferring the production of a graph until it is needed.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use cloudgraph::graph::{Graph, LazyGraph, Query, Resource, TripleGraph};
///
/// let lazy = LazyGraph::new(|| {
///     let graph = TripleGraph::new();
///     graph.add_resource(&Resource::builder("vpc", "vpc-1").build());
///     Arc::new(graph)
/// });
/// assert!(!lazy.is_loaded());
/// assert_eq!(lazy.find(&Query::new(["vpc"])).unwrap().len(), 1);
/// assert!(lazy.is_loaded());
/// ```
pub struct LazyGraph {
    loader: Loader,
    loaded: OnceLock<SharedGraph>,
}

impl LazyGraph {
    pub fn new(loader: impl Fn() -> SharedGraph + Send + Sync + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            loaded: OnceLock::new(),
        }
    }

    /// Whether the loader has already run. Does not force the load.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Force the load and return the loaded graph.
    pub fn force(&self) -> &SharedGraph {
        self.loaded.get_or_init(|| {
            debug!("loading lazy graph");
            (self.loader)()
        })
    }
}

impl fmt::Debug for LazyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyGraph")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Graph for LazyGraph {
    fn find(&self, query: &Query) -> Result<Vec<Resource>, GraphError> {
        self.force().find(query)
    }

    fn find_one(&self, query: &Query) -> Result<Resource, GraphError> {
        self.force().find_one(query)
    }

    fn filter_graph(&self, query: &Query) -> Result<SharedGraph, GraphError> {
        self.force().filter_graph(query)
    }

    /// Visitors see the loaded graph, so capability checks apply to it.
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<(), GraphError> {
        self.force().accept(visitor)
    }

    fn marshal_to(&self, writer: &mut dyn Write) -> Result<(), GraphError> {
        self.force().marshal_to(writer)
    }

    fn as_traversable(&self) -> Option<&dyn HierarchyTraversable> {
        self.force().as_traversable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{collect_into, ChildrenVisitor, TripleGraph};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: Arc<AtomicUsize>) -> LazyGraph {
        LazyGraph::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let graph = TripleGraph::new();
            let vpc = Resource::builder("vpc", "vpc-1").build();
            let subnet = Resource::builder("subnet", "sub-1").build();
            graph.add_resource(&vpc);
            graph.add_resource(&subnet);
            graph.add_parent_of(&vpc, &subnet);
            Arc::new(graph)
        })
    }

    #[test]
    fn loads_once_across_calls() {
        let counter = Arc::new(AtomicUsize::new(0));
        let lazy = counting(counter.clone());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        lazy.find(&Query::any()).unwrap();
        lazy.find_one(&Query::new(["vpc"])).unwrap();
        let mut out = Vec::new();
        lazy.marshal_to(&mut out).unwrap();
        assert!(!out.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn visitors_walk_the_loaded_graph() {
        let lazy = counting(Arc::new(AtomicUsize::new(0)));
        let vpc = Resource::builder("vpc", "vpc-1").build();
        let mut found = Vec::new();
        let mut visitor = ChildrenVisitor::new(vpc, false, collect_into(&mut found));
        lazy.accept(&mut visitor).unwrap();
        drop(visitor);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "sub-1");
    }

    #[test]
    fn debug_does_not_force() {
        let counter = Arc::new(AtomicUsize::new(0));
        let lazy = counting(counter.clone());
        assert!(format!("{lazy:?}").contains("false"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
