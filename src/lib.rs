//! cloudgraph - A local, versioned graph of cloud resources
//!
//! cloudgraph keeps the resources of cloud accounts as a triple-backed
//! graph: resources with typed properties, linked by named relations and
//! organized by a parent/child hierarchy. Sync runs pull each service's
//! graph, write it as a text file per region and service, and commit the
//! result to a local git repository so every run can be compared with the
//! previous ones.
//!
//! # Architecture
//!
//! - [`graph`] - Resources, queries, the triple store, visitors, lazy graphs
//! - [`sync`] - Concurrent fetch of services, persistence and history
//! - [`git`] - Single interface for all Git operations
//! - [`core`] - Strong types, store paths, configuration and locking
//! - [`cli`] - Command-line interface layer
//!
//! # Correctness Invariants
//!
//! 1. Traversals and decoded resources read one immutable snapshot
//! 2. Encoding a graph is deterministic, so unchanged content means an
//!    unchanged file and no new commit
//! 3. Only one sync run commits into a store at a time
//! 4. A failing source never aborts the others

pub mod cli;
pub mod core;
pub mod git;
pub mod graph;
pub mod sync;
