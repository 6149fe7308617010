//! core::ops
//!
//! Locking for the sync commit step.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive store lock
//!
//! # Architecture
//!
//! Fetching and writing source files needs no lock: every source owns a
//! distinct file. Only staging and committing touch shared state (the git
//! index and HEAD), so that step runs while holding [`lock::SyncLock`].

pub mod lock;
