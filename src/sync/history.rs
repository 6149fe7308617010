//! sync::history
//!
//! Read side of the sync store: past revisions, graphs as they were
//! committed, and the drift between two revisions.

use std::collections::BTreeSet;
use std::fs;
use std::io::BufReader;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{is_graph_file, SyncError};
use crate::core::paths::StorePaths;
use crate::core::types::{Oid, Region, ServiceName};
use crate::git::Git;
use crate::graph::{codec, Triple, TripleGraph};

/// One commit of the sync store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub oid: Oid,
    pub summary: String,
    pub time: DateTime<Utc>,
}

/// Triples that appeared and disappeared between two revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    pub added: Vec<Triple>,
    pub removed: Vec<Triple>,
}

impl Drift {
    pub fn between(from: &TripleGraph, to: &TripleGraph) -> Self {
        let before: BTreeSet<Triple> = from.snapshot().triples().into_iter().collect();
        let after: BTreeSet<Triple> = to.snapshot().triples().into_iter().collect();
        Self {
            added: after.difference(&before).cloned().collect(),
            removed: before.difference(&after).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Subjects touched by the drift, ascending.
    pub fn subjects(&self) -> BTreeSet<&str> {
        self.added
            .iter()
            .chain(&self.removed)
            .map(|t| t.subject.as_str())
            .collect()
    }
}

/// The history of a sync store.
#[derive(Debug)]
pub struct History {
    paths: StorePaths,
    git: Git,
}

impl History {
    /// Open the history of the store described by `paths`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Git`] if the store was never synced.
    pub fn open(paths: &StorePaths) -> Result<Self, SyncError> {
        let git = Git::open(&paths.repo_dir())?;
        Ok(Self {
            paths: paths.clone(),
            git,
        })
    }

    /// Up to `limit` revisions, newest first.
    pub fn revisions(&self, limit: usize) -> Result<Vec<Revision>, SyncError> {
        let commits = self.git.log(limit)?;
        Ok(commits
            .into_iter()
            .map(|c| Revision {
                oid: c.oid,
                summary: c.summary,
                time: c.author_time,
            })
            .collect())
    }

    /// Resolve `HEAD`, `HEAD~n` or a (possibly abbreviated) commit id.
    pub fn resolve(&self, revision: &str) -> Result<Oid, SyncError> {
        Ok(self.git.resolve_revision(revision)?)
    }

    /// The graph of one source as committed in `oid`.
    ///
    /// A source absent from that revision yields an empty graph.
    pub fn graph_at(
        &self,
        oid: &Oid,
        region: &Region,
        service: &ServiceName,
    ) -> Result<TripleGraph, SyncError> {
        let path = self.paths.relative_source_file(region, service);
        match self.git.read_file_at(oid, &path)? {
            Some(bytes) => Ok(TripleGraph::from_triples(codec::read_triples(
                bytes.as_slice(),
            )?)),
            None => Ok(TripleGraph::new()),
        }
    }

    /// What changed in one source between two revisions.
    pub fn drift(
        &self,
        from: &Oid,
        to: &Oid,
        region: &Region,
        service: &ServiceName,
    ) -> Result<Drift, SyncError> {
        let before = self.graph_at(from, region, service)?;
        let after = self.graph_at(to, region, service)?;
        Ok(Drift::between(&before, &after))
    }
}

/// Merge every graph file of a region from the working tree.
///
/// A region that was never synced yields an empty graph.
pub fn load_local_graph(paths: &StorePaths, region: &Region) -> Result<TripleGraph, SyncError> {
    let dir = paths.region_dir(region);
    let graph = TripleGraph::new();
    if !dir.is_dir() {
        return Ok(graph);
    }

    let entries = fs::read_dir(&dir)
        .map_err(|e| SyncError::persistence(&format!("read {}", dir.display()), e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| SyncError::persistence(&format!("read {}", dir.display()), e))?
            .path();
        if path.is_file() && is_graph_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let file = fs::File::open(&path)
            .map_err(|e| SyncError::persistence(&format!("open {}", path.display()), e))?;
        graph.add_triples(codec::read_triples(BufReader::new(file))?);
    }
    Ok(graph)
}
