//! sync
//!
//! Pull graphs from cloud services and record them as versioned files.
//!
//! # Architecture
//!
//! A sync run goes through four phases:
//!
//! 1. **Select**: disabled services are skipped, names and regions are
//!    validated as path segments
//! 2. **Fetch**: services are fetched concurrently, at most
//!    `workers` at a time, each under the fetch timeout
//! 3. **Write**: each fetched graph is marshalled to
//!    `<root>/<provider>/<encoding>/<region>/<service>.nt` (temp file, then
//!    rename)
//! 4. **Commit**: the working tree is staged and committed once, inside
//!    the commit critical section
//!
//! # Invariants
//!
//! - A failing source never aborts the others; it is reported in
//!   [`SyncReport::failures`]
//! - The commit step runs under both the engine's async mutex and the
//!   store's [`SyncLock`], so concurrent runs on one store serialize
//! - A run that changes nothing makes no commit
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cloudgraph::core::config::SyncSettings;
//! use cloudgraph::sync::Syncer;
//!
//! let syncer = Syncer::new(SyncSettings::new("/tmp/store"));
//! let report = syncer.sync(&[Arc::new(infra), Arc::new(access)]).await?;
//! println!("{} written, commit {:?}", report.written.len(), report.commit);
//! ```

pub mod history;
pub mod service;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::core::config::{CommitPolicy, SyncSettings};
use crate::core::ops::lock::{LockError, SyncLock};
use crate::core::paths::{StorePaths, FILE_EXT};
use crate::core::types::{Oid, Region, ServiceName};
use crate::git::{Author, Git, GitError};
use crate::graph::{marshal, GraphError, SharedGraph};

pub use history::{load_local_graph, Drift, History, Revision};
pub use service::{CancelToken, FetchError, Service};

/// Fatal errors of a sync run or a history query.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The store could not be written or committed.
    #[error("persistence failed: {message}")]
    PersistenceFailed { message: String },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Git(#[from] GitError),

    /// A recorded graph could not be decoded.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SyncError {
    fn persistence(context: &str, err: impl fmt::Display) -> Self {
        SyncError::PersistenceFailed {
            message: format!("{context}: {err}"),
        }
    }
}

/// Why a single source failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service could not produce its graph.
    SourceFetchFailed,
    /// The graph could not be written to the store.
    WriteFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::SourceFetchFailed => write!(f, "fetch failed"),
            FailureKind::WriteFailed => write!(f, "write failed"),
        }
    }
}

/// A source that did not make it into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub service: String,
    pub region: String,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: {}: {}",
            self.region, self.service, self.kind, self.message
        )
    }
}

/// Outcome of a sync run.
#[derive(Default)]
pub struct SyncReport {
    /// Fetched graphs by region and service name.
    pub graphs: BTreeMap<(Region, ServiceName), SharedGraph>,
    /// Files written, sorted.
    pub written: Vec<PathBuf>,
    /// Names of disabled services.
    pub skipped: Vec<String>,
    /// Sources that failed, sorted by region then service.
    pub failures: Vec<SourceFailure>,
    /// The commit made by this run, if the store changed.
    pub commit: Option<Oid>,
}

impl SyncReport {
    /// Whether every enabled source was fetched and written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Debug for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncReport")
            .field("graphs", &self.graphs.keys().collect::<Vec<_>>())
            .field("written", &self.written)
            .field("skipped", &self.skipped)
            .field("failures", &self.failures)
            .field("commit", &self.commit)
            .finish()
    }
}

/// A validated source ready to fetch.
struct Target {
    name: ServiceName,
    region: Region,
    service: Arc<dyn Service>,
}

/// The sync engine.
#[derive(Debug)]
pub struct Syncer {
    settings: SyncSettings,
    commit_gate: Mutex<()>,
}

impl Syncer {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            settings,
            commit_gate: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Fetch every enabled service, write its graph and commit the store.
    ///
    /// # Errors
    ///
    /// Only the commit step is fatal. Per-source problems are reported in
    /// [`SyncReport::failures`].
    pub async fn sync(&self, services: &[Arc<dyn Service>]) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        let targets = self.select(services, &mut report);

        let fetched = self.fetch_all(targets, &mut report).await;

        for (name, region, graph) in fetched {
            let path = self.settings.paths.source_file(&region, &name);
            match write_graph(&path, graph.as_ref()).await {
                Ok(()) => {
                    debug!(service = %name, region = %region, path = %path.display(), "wrote graph");
                    report.written.push(path);
                    report.graphs.insert((region, name), graph);
                }
                Err(message) => {
                    warn!(service = %name, region = %region, error = %message, "write failed");
                    report.failures.push(SourceFailure {
                        service: name.to_string(),
                        region: region.to_string(),
                        kind: FailureKind::WriteFailed,
                        message,
                    });
                }
            }
        }

        report.written.sort();
        report
            .failures
            .sort_by(|a, b| (&a.region, &a.service).cmp(&(&b.region, &b.service)));

        if self.settings.commit_policy == CommitPolicy::AllOrNothing && !report.is_complete() {
            warn!(
                failures = report.failures.len(),
                "withholding commit: not every source succeeded"
            );
            return Ok(report);
        }

        report.commit = self.commit(&report).await?;
        Ok(report)
    }

    fn select(&self, services: &[Arc<dyn Service>], report: &mut SyncReport) -> Vec<Target> {
        let mut targets = Vec::new();
        for service in services {
            if service.is_sync_disabled() {
                debug!(service = service.name(), "sync disabled, skipping");
                report.skipped.push(service.name().to_string());
                continue;
            }

            let validated = ServiceName::new(service.name())
                .and_then(|name| Region::new(service.region()).map(|region| (name, region)));
            match validated {
                Ok((name, region)) => targets.push(Target {
                    name,
                    region,
                    service: Arc::clone(service),
                }),
                Err(e) => {
                    warn!(service = service.name(), region = service.region(), error = %e, "invalid source");
                    report.failures.push(SourceFailure {
                        service: service.name().to_string(),
                        region: service.region().to_string(),
                        kind: FailureKind::WriteFailed,
                        message: e.to_string(),
                    });
                }
            }
        }
        targets
    }

    async fn fetch_all(
        &self,
        targets: Vec<Target>,
        report: &mut SyncReport,
    ) -> Vec<(ServiceName, Region, SharedGraph)> {
        let workers = Arc::new(Semaphore::new(self.settings.workers.max(1)));
        let timeout = self.settings.fetch_timeout;
        let mut tasks = JoinSet::new();
        let mut pending = BTreeMap::new();

        for (slot, target) in targets.into_iter().enumerate() {
            pending.insert(slot, (target.name.clone(), target.region.clone()));
            let workers = Arc::clone(&workers);
            tasks.spawn(async move {
                let outcome = match workers.acquire_owned().await {
                    Ok(_permit) => fetch_with_deadline(target.service.as_ref(), timeout).await,
                    Err(_) => Err(FetchError::Cancelled),
                };
                (slot, target.name, target.region, outcome)
            });
        }

        let mut fetched = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let Ok((slot, name, region, outcome)) = joined else {
                continue;
            };
            pending.remove(&slot);
            match outcome {
                Ok(graph) => {
                    debug!(service = %name, region = %region, "fetched");
                    fetched.push((name, region, graph));
                }
                Err(e) => {
                    warn!(service = %name, region = %region, error = %e, "fetch failed");
                    report.failures.push(SourceFailure {
                        service: name.to_string(),
                        region: region.to_string(),
                        kind: FailureKind::SourceFetchFailed,
                        message: e.to_string(),
                    });
                }
            }
        }

        // tasks that never reported back panicked
        for (name, region) in pending.into_values() {
            warn!(service = %name, region = %region, "fetch task panicked");
            report.failures.push(SourceFailure {
                service: name.to_string(),
                region: region.to_string(),
                kind: FailureKind::SourceFetchFailed,
                message: "fetch task panicked".to_string(),
            });
        }

        fetched.sort_by(|a, b| (&a.1, &a.0).cmp(&(&b.1, &b.0)));
        fetched
    }

    /// The commit critical section.
    async fn commit(&self, report: &SyncReport) -> Result<Option<Oid>, SyncError> {
        let _gate = self.commit_gate.lock().await;

        let paths = self.settings.paths.clone();
        let author = Author::new(&self.settings.author_name, &self.settings.author_email);
        let message = commit_message(&paths, report);

        tokio::task::spawn_blocking(move || commit_store(&paths, &message, &author))
            .await
            .map_err(|e| SyncError::persistence("commit task", e))?
    }
}

/// How long a fetch may keep running after its token fires.
const CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Run one fetch under the deadline.
///
/// When the deadline hits, the token is cancelled while the fetch is still
/// being polled, and the fetch gets [`CANCEL_GRACE`] to wind down before
/// it is dropped. The outcome is a timeout either way.
async fn fetch_with_deadline(
    service: &dyn Service,
    timeout: Duration,
) -> Result<SharedGraph, FetchError> {
    let cancel = CancelToken::new();
    let mut fetch = service.fetch(cancel.clone());

    tokio::select! {
        outcome = &mut fetch => return outcome,
        () = tokio::time::sleep(timeout) => {}
    }

    cancel.cancel();
    if tokio::time::timeout(CANCEL_GRACE, &mut fetch).await.is_err() {
        debug!(service = service.name(), "fetch ignored cancellation");
    }
    Err(FetchError::TimedOut(timeout))
}

/// Marshal `graph` and atomically replace `path` with it.
async fn write_graph(path: &Path, graph: &dyn crate::graph::Graph) -> Result<(), String> {
    let bytes = marshal(graph).map_err(|e| format!("marshal: {e}"))?;

    let dir = path
        .parent()
        .ok_or_else(|| format!("{} has no parent directory", path.display()))?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| format!("cannot create {}: {e}", dir.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{file_name}.tmp"));

    tokio::fs::write(&temp, &bytes)
        .await
        .map_err(|e| format!("cannot write {}: {e}", temp.display()))?;
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(format!("cannot rename into {}: {e}", path.display()));
    }
    Ok(())
}

fn commit_message(paths: &StorePaths, report: &SyncReport) -> String {
    let mut message = format!(
        "sync {} source{}",
        report.written.len(),
        if report.written.len() == 1 { "" } else { "s" }
    );
    let repo = paths.repo_dir();
    let files: Vec<String> = report
        .written
        .iter()
        .map(|p| p.strip_prefix(&repo).unwrap_or(p).display().to_string())
        .collect();
    if !files.is_empty() {
        message.push_str("\n\n");
        message.push_str(&files.join("\n"));
    }
    if !report.failures.is_empty() {
        message.push_str("\n\nfailed:\n");
        let failed: Vec<String> = report.failures.iter().map(ToString::to_string).collect();
        message.push_str(&failed.join("\n"));
    }
    message
}

/// Stage and commit the working tree under the store lock.
fn commit_store(
    paths: &StorePaths,
    message: &str,
    author: &Author,
) -> Result<Option<Oid>, SyncError> {
    paths
        .ensure_dirs()
        .map_err(|e| SyncError::persistence("create store", e))?;

    let _lock = SyncLock::acquire(paths)?;
    let git = Git::init_or_open(&paths.repo_dir())?;

    git.stage_all()?;
    if !git.has_staged_changes()? {
        debug!(repo = %paths.repo_dir().display(), "store unchanged, nothing to commit");
        return Ok(None);
    }

    let oid = git.commit(message, author)?;
    info!(commit = %oid.short(7), "committed sync");
    Ok(Some(oid))
}

/// Whether `path` is a graph file of the store.
pub(crate) fn is_graph_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FILE_EXT)
}
