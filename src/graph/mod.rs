//! graph
//!
//! The resource graph: typed resources stored as triples, queried with
//! [`Query`] and walked with visitors.
//!
//! # Architecture
//!
//! - [`triple`] defines triples, literals, values and the vocabulary
//! - [`store`] holds the triple index, snapshots and the live [`TripleGraph`]
//! - [`codec`] reads and writes the line-oriented encoding
//! - [`visit`] implements hierarchy traversals
//! - [`lazy`] defers loading a graph until first use
//!
//! Every graph implements [`Graph`]. Capabilities that not every graph
//! has (hierarchy traversal) are discovered through
//! [`Graph::as_traversable`] rather than by inspecting concrete types.

pub mod codec;
pub mod lazy;
pub mod query;
pub mod resource;
pub mod store;
pub mod triple;
pub mod visit;

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;

pub use codec::CodecError;
pub use lazy::LazyGraph;
pub use query::Query;
pub use resource::{Resource, ResourceBuilder};
pub use store::{Snapshot, TripleGraph, TripleIndex};
pub use triple::{vocab, Datatype, Literal, Object, Triple, Value};
pub use visit::{
    callback_error, collect_into, ChildrenVisitor, HierarchyTraversable, ParentsVisitor,
    SiblingsVisitor, Tree, Visitor,
};

/// A graph shared across threads.
pub type SharedGraph = Arc<dyn Graph>;

/// Errors from graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No resource matched.
    #[error("no resource matches {query}")]
    NotFound { query: String },

    /// More than one resource matched where one was expected.
    #[error("{count} resources match {query}, expected exactly one")]
    Ambiguous { query: String, count: usize },

    /// The graph lacks a capability the operation needs.
    #[error("graph does not support {0}")]
    UnsupportedCapability(String),

    #[error("malformed graph encoding: {0}")]
    Codec(#[from] CodecError),

    #[error("graph i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A visitor callback failed; the original error is the source.
    #[error("visit aborted: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The capability interface shared by every graph.
///
/// Implementations must be safe to share across threads. All methods are
/// reads: none of them changes the receiver.
pub trait Graph: Send + Sync {
    /// Every resource matching `query`, ordered by (kind, id).
    fn find(&self, query: &Query) -> Result<Vec<Resource>, GraphError>;

    /// The single resource matching `query`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotFound`] if nothing matches
    /// - [`GraphError::Ambiguous`] if several resources match
    fn find_one(&self, query: &Query) -> Result<Resource, GraphError>;

    /// A new graph restricted to the resources matching `query`.
    fn filter_graph(&self, query: &Query) -> Result<SharedGraph, GraphError>;

    /// Let `visitor` walk this graph.
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<(), GraphError>;

    /// Write the graph in its native encoding.
    fn marshal_to(&self, writer: &mut dyn Write) -> Result<(), GraphError>;

    /// Hierarchy traversal capability, if this graph has it.
    fn as_traversable(&self) -> Option<&dyn HierarchyTraversable> {
        None
    }
}

/// Encode a graph into a byte buffer.
pub fn marshal(graph: &dyn Graph) -> Result<Vec<u8>, GraphError> {
    let mut buf = Vec::new();
    graph.marshal_to(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A graph with no hierarchy capability.
    struct Flat;

    impl Graph for Flat {
        fn find(&self, _: &Query) -> Result<Vec<Resource>, GraphError> {
            Ok(Vec::new())
        }

        fn find_one(&self, query: &Query) -> Result<Resource, GraphError> {
            Err(GraphError::NotFound {
                query: query.to_string(),
            })
        }

        fn filter_graph(&self, _: &Query) -> Result<SharedGraph, GraphError> {
            Ok(Arc::new(Flat))
        }

        fn accept(&self, visitor: &mut dyn Visitor) -> Result<(), GraphError> {
            visitor.visit(self)
        }

        fn marshal_to(&self, _: &mut dyn Write) -> Result<(), GraphError> {
            Ok(())
        }
    }

    #[test]
    fn visitors_reject_graphs_without_hierarchy() {
        let start = Resource::builder("vpc", "vpc-1").build();
        let mut visitor = ParentsVisitor::new(start, true, |_, _| Ok(()));
        let err = Flat.accept(&mut visitor).unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedCapability(_)));
    }

    #[test]
    fn marshal_is_deterministic() {
        let a = TripleGraph::new();
        let b = TripleGraph::new();
        let vpc = Resource::builder("vpc", "vpc-1").property("Name", "main").build();
        let subnet = Resource::builder("subnet", "sub-1").build();

        a.add_resource(&vpc);
        a.add_resource(&subnet);
        a.add_parent_of(&vpc, &subnet);

        b.add_parent_of(&vpc, &subnet);
        b.add_resource(&subnet);
        b.add_resource(&vpc);

        assert_eq!(marshal(&a).unwrap(), marshal(&b).unwrap());
    }

    #[test]
    fn error_messages() {
        let err = GraphError::Ambiguous {
            query: "instance".into(),
            count: 3,
        };
        assert!(err.to_string().contains('3'));
        let err = GraphError::UnsupportedCapability("hierarchy traversal".into());
        assert!(err.to_string().contains("hierarchy"));
    }
}
