//! sync::service
//!
//! The collaborator a sync run pulls graphs from.
//!
//! A [`Service`] stands for one cloud API in one region. It knows how to
//! produce the graph of its resources; the sync engine decides when, with
//! what deadline, and where the result lands.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::graph::SharedGraph;

/// Errors a service reports from a fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch observed its cancel token and stopped.
    #[error("fetch cancelled")]
    Cancelled,

    /// The fetch did not finish within the configured deadline.
    #[error("fetch timed out after {0:?}")]
    TimedOut(Duration),

    /// The remote API could not be reached or refused the request.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The remote API answered with something that cannot become a graph.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The service does not offer the requested operation.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Cooperative cancellation signal handed to every fetch.
///
/// Clones share state: cancelling one cancels all of them.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Signal every holder to stop.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // the sender lives as long as `self`, so this only returns on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// `Err(FetchError::Cancelled)` if cancelled, for early returns.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// One sync source: a cloud API in a region.
#[async_trait]
pub trait Service: Send + Sync {
    /// Service name; becomes the file name of its graph.
    fn name(&self) -> &str;

    /// Region; becomes the directory of its graph.
    fn region(&self) -> &str;

    /// Fetch the full graph of this service.
    ///
    /// Implementations should return [`FetchError::Cancelled`] promptly once
    /// `cancel` fires.
    async fn fetch(&self, cancel: CancelToken) -> Result<SharedGraph, FetchError>;

    /// Disabled services are skipped by sync runs.
    fn is_sync_disabled(&self) -> bool {
        false
    }

    /// Resource kinds this service can fetch individually.
    fn resource_types(&self) -> Vec<String> {
        Vec::new()
    }

    /// Fetch only the resources of `kind`.
    async fn fetch_by_type(
        &self,
        kind: &str,
        _cancel: CancelToken,
    ) -> Result<SharedGraph, FetchError> {
        Err(FetchError::Unsupported(format!(
            "{} cannot fetch {kind} individually",
            self.name()
        )))
    }
}
