//! core
//!
//! Core domain types, schemas, and operations for cloudgraph.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Region, ServiceName, Oid
//! - [`paths`] - Centralized path routing for the sync store
//! - [`config`] - Configuration schema and loading
//! - [`ops`] - Store locking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Every store path is derived in one place

pub mod config;
pub mod ops;
pub mod paths;
pub mod types;
