//! Integration tests for sync runs and their history.
//!
//! Services are scripted in-process; every store lives in a temp directory.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tempfile::TempDir;

use cloudgraph::core::config::{CommitPolicy, SyncSettings};
use cloudgraph::core::types::{Region, ServiceName};
use cloudgraph::graph::{Graph, Query, Resource, SharedGraph, TripleGraph};
use cloudgraph::sync::{
    load_local_graph, CancelToken, FailureKind, FetchError, History, Service, Syncer,
};

// =============================================================================
// Test Helpers
// =============================================================================

enum Behavior {
    Serve,
    Fail,
    Stall,
}

struct Scripted {
    name: String,
    region: String,
    disabled: bool,
    behavior: Behavior,
    resources: RwLock<Vec<Resource>>,
    saw_cancel: AtomicBool,
}

impl Scripted {
    fn new(name: &str, region: &str, resources: Vec<Resource>) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            disabled: false,
            behavior: Behavior::Serve,
            resources: RwLock::new(resources),
            saw_cancel: AtomicBool::new(false),
        }
    }

    fn failing(name: &str, region: &str) -> Self {
        Self {
            behavior: Behavior::Fail,
            ..Self::new(name, region, Vec::new())
        }
    }

    fn stalled(name: &str, region: &str) -> Self {
        Self {
            behavior: Behavior::Stall,
            ..Self::new(name, region, Vec::new())
        }
    }

    fn disabled(name: &str, region: &str) -> Self {
        Self {
            disabled: true,
            ..Self::new(name, region, vec![instance("i-off", "off")])
        }
    }

    fn replace(&self, resources: Vec<Resource>) {
        *self.resources.write() = resources;
    }
}

#[async_trait]
impl Service for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn is_sync_disabled(&self) -> bool {
        self.disabled
    }

    async fn fetch(&self, cancel: CancelToken) -> Result<SharedGraph, FetchError> {
        match self.behavior {
            Behavior::Serve => {
                let graph = TripleGraph::new();
                for resource in self.resources.read().iter() {
                    graph.add_resource(resource);
                }
                Ok(Arc::new(graph))
            }
            Behavior::Fail => Err(FetchError::Unavailable("connection refused".into())),
            Behavior::Stall => {
                cancel.cancelled().await;
                self.saw_cancel.store(true, Ordering::SeqCst);
                Err(FetchError::Cancelled)
            }
        }
    }
}

fn instance(id: &str, state: &str) -> Resource {
    Resource::builder("instance", id)
        .property("State", state)
        .build()
}

fn sources(list: Vec<Scripted>) -> Vec<Arc<dyn Service>> {
    list.into_iter()
        .map(|s| Arc::new(s) as Arc<dyn Service>)
        .collect()
}

fn settings(dir: &TempDir) -> SyncSettings {
    SyncSettings::new(dir.path()).with_fetch_timeout(Duration::from_secs(5))
}

// =============================================================================
// Sync runs
// =============================================================================

#[tokio::test]
async fn sync_writes_one_file_per_source_and_commits() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    let services = sources(vec![
        Scripted::new("infra", "paris", vec![instance("i-1", "running")]),
        Scripted::new("infra", "bali", vec![instance("i-2", "stopped")]),
    ]);

    let report = syncer.sync(&services).await.unwrap();

    assert!(report.is_complete());
    let paris = dir.path().join("aws/rdf/paris/infra.nt");
    let bali = dir.path().join("aws/rdf/bali/infra.nt");
    assert!(paris.is_file());
    assert!(bali.is_file());
    assert_eq!(report.written, vec![bali, paris]);
    assert!(dir.path().join("aws/rdf/.git").is_dir());

    // one graph per region, even under a shared service name
    assert_eq!(report.graphs.len(), report.written.len());
    let infra = ServiceName::new("infra").unwrap();
    let bali_graph = &report.graphs[&(Region::new("bali").unwrap(), infra.clone())];
    let ids: Vec<String> = bali_graph
        .find(&Query::any())
        .unwrap()
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    assert_eq!(ids, vec!["i-2"]);
    assert!(report.graphs.contains_key(&(Region::new("paris").unwrap(), infra)));

    let history = History::open(&syncer.settings().paths).unwrap();
    let revisions = history.revisions(10).unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(Some(revisions[0].oid.clone()), report.commit);
    assert_eq!(revisions[0].summary, "sync 2 sources");
}

#[tokio::test]
async fn unchanged_sync_is_byte_identical_and_not_committed() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    let services = sources(vec![Scripted::new(
        "svc1",
        "paris",
        vec![instance("i-1", "running"), instance("i-2", "stopped")],
    )]);
    let file = dir.path().join("aws/rdf/paris/svc1.nt");

    let first = syncer.sync(&services).await.unwrap();
    let before = fs::read(&file).unwrap();
    let second = syncer.sync(&services).await.unwrap();
    let after = fs::read(&file).unwrap();

    assert!(first.commit.is_some());
    assert_eq!(second.commit, None);
    assert_eq!(before, after);

    let history = History::open(&syncer.settings().paths).unwrap();
    assert_eq!(history.revisions(10).unwrap().len(), 1);
}

#[tokio::test]
async fn disabled_sources_are_skipped() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    let services = sources(vec![
        Scripted::new("svc1", "paris", vec![instance("i-1", "running")]),
        Scripted::disabled("svc2", "paris"),
    ]);

    let report = syncer.sync(&services).await.unwrap();

    assert_eq!(report.skipped, vec!["svc2".to_string()]);
    assert!(report.is_complete());
    assert!(!dir.path().join("aws/rdf/paris/svc2.nt").exists());
}

#[tokio::test]
async fn failed_sources_do_not_stop_the_others() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    let services = sources(vec![
        Scripted::failing("broken", "paris"),
        Scripted::new("svc1", "paris", vec![instance("i-1", "running")]),
    ]);

    let report = syncer.sync(&services).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.service, "broken");
    assert_eq!(failure.kind, FailureKind::SourceFetchFailed);
    assert!(failure.message.contains("connection refused"));

    // the healthy source is still committed by default
    assert!(dir.path().join("aws/rdf/paris/svc1.nt").is_file());
    assert!(report.commit.is_some());
}

#[tokio::test]
async fn all_or_nothing_withholds_the_commit() {
    let dir = TempDir::new().unwrap();
    let syncer =
        Syncer::new(settings(&dir).with_commit_policy(CommitPolicy::AllOrNothing));
    let services = sources(vec![
        Scripted::failing("broken", "paris"),
        Scripted::new("svc1", "paris", vec![instance("i-1", "running")]),
    ]);

    let report = syncer.sync(&services).await.unwrap();

    assert_eq!(report.commit, None);
    assert_eq!(report.written.len(), 1);
    assert!(History::open(&syncer.settings().paths).is_err());
}

#[tokio::test]
async fn stalled_fetches_time_out_and_are_cancelled() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(
        SyncSettings::new(dir.path())
            .with_fetch_timeout(Duration::from_millis(100))
            .with_workers(1),
    );
    let slow = Arc::new(Scripted::stalled("slow", "paris"));
    let services: Vec<Arc<dyn Service>> = vec![
        slow.clone() as Arc<dyn Service>,
        Arc::new(Scripted::new("svc1", "paris", vec![instance("i-1", "running")])),
    ];

    let report = tokio::time::timeout(Duration::from_secs(10), syncer.sync(&services))
        .await
        .expect("sync finishes despite the stalled source")
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].service, "slow");
    assert!(report.failures[0].message.contains("timed out"));
    assert_eq!(report.written.len(), 1);
    // the stalled fetch was still running when its token fired
    assert!(slow.saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn invalid_names_are_reported() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    let services = sources(vec![
        Scripted::new("../escape", "paris", vec![instance("i-1", "running")]),
        Scripted::new("svc1", "paris", vec![instance("i-1", "running")]),
    ]);

    let report = syncer.sync(&services).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::WriteFailed);
    assert_eq!(report.written.len(), 1);
}

#[tokio::test]
async fn concurrent_runs_on_one_store_serialize() {
    let dir = TempDir::new().unwrap();
    let syncer = Arc::new(Syncer::new(settings(&dir)));
    let first = sources(vec![Scripted::new(
        "svc1",
        "paris",
        vec![instance("i-1", "running")],
    )]);
    let second = sources(vec![Scripted::new(
        "svc2",
        "bali",
        vec![instance("i-2", "running")],
    )]);

    let (a, b) = tokio::join!(syncer.sync(&first), syncer.sync(&second));
    let (a, b) = (a.unwrap(), b.unwrap());

    // a run may commit the other's file too, leaving nothing for the second
    let commits = [a.commit, b.commit].into_iter().flatten().count();
    assert!(commits >= 1);
    let history = History::open(&syncer.settings().paths).unwrap();
    assert_eq!(history.revisions(10).unwrap().len(), commits);

    let head = history.resolve("HEAD").unwrap();
    let paris = history
        .graph_at(&head, &Region::new("paris").unwrap(), &ServiceName::new("svc1").unwrap())
        .unwrap();
    let bali = history
        .graph_at(&head, &Region::new("bali").unwrap(), &ServiceName::new("svc2").unwrap())
        .unwrap();
    assert!(!paris.is_empty());
    assert!(!bali.is_empty());
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn drift_between_two_runs() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    let source = Arc::new(Scripted::new(
        "svc1",
        "paris",
        vec![instance("i-1", "running"), instance("i-2", "running")],
    ));
    let services: Vec<Arc<dyn Service>> = vec![source.clone()];

    syncer.sync(&services).await.unwrap();
    source.replace(vec![instance("i-1", "stopped"), instance("i-3", "running")]);
    syncer.sync(&services).await.unwrap();

    let history = History::open(&syncer.settings().paths).unwrap();
    let from = history.resolve("HEAD~1").unwrap();
    let to = history.resolve("HEAD").unwrap();
    let region = Region::new("paris").unwrap();
    let service = ServiceName::new("svc1").unwrap();

    let drift = history.drift(&from, &to, &region, &service).unwrap();
    assert!(!drift.is_empty());
    let touched: Vec<&str> = drift.subjects().into_iter().collect();
    assert_eq!(touched, vec!["i-1", "i-2", "i-3"]);

    let before = history.graph_at(&from, &region, &service).unwrap();
    let state = before
        .find_one(&Query::new(["instance"]).property("ID", "i-1"))
        .unwrap();
    assert_eq!(state.property("State").map(ToString::to_string), Some("running".into()));

    let unchanged = history.drift(&to, &to, &region, &service).unwrap();
    assert!(unchanged.is_empty());
}

#[tokio::test]
async fn sources_missing_from_a_revision_read_as_empty() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    syncer
        .sync(&sources(vec![Scripted::new(
            "svc1",
            "paris",
            vec![instance("i-1", "running")],
        )]))
        .await
        .unwrap();

    let history = History::open(&syncer.settings().paths).unwrap();
    let head = history.resolve("HEAD").unwrap();
    let graph = history
        .graph_at(
            &head,
            &Region::new("bali").unwrap(),
            &ServiceName::new("svc1").unwrap(),
        )
        .unwrap();
    assert!(graph.is_empty());
}

#[tokio::test]
async fn local_graph_merges_every_source_of_a_region() {
    let dir = TempDir::new().unwrap();
    let syncer = Syncer::new(settings(&dir));
    syncer
        .sync(&sources(vec![
            Scripted::new("svc1", "paris", vec![instance("i-1", "running")]),
            Scripted::new("svc2", "paris", vec![instance("i-2", "running")]),
            Scripted::new("svc3", "bali", vec![instance("i-3", "running")]),
        ]))
        .await
        .unwrap();

    let paris = load_local_graph(&syncer.settings().paths, &Region::new("paris").unwrap()).unwrap();
    let found = paris.find(&Query::new(["instance"])).unwrap();
    let ids: Vec<&str> = found.iter().map(Resource::id).collect();
    assert_eq!(ids, vec!["i-1", "i-2"]);

    let nowhere = load_local_graph(&syncer.settings().paths, &Region::new("mars").unwrap()).unwrap();
    assert!(nowhere.is_empty());
}
