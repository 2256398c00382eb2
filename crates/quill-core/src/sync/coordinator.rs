//! Sync lifecycle coordination

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{Conflict, ResolutionChoice, Resolutions};
use crate::store::SharedQuoteStore;
use crate::sync::detect::detect_conflicts;
use crate::sync::fetcher::RemoteFetcher;
use crate::sync::merge::merge_quotes;
use crate::util::unix_timestamp_ms;

/// Lifecycle states of the sync pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No sync in flight
    Idle,
    /// A fetch/detect/merge pipeline is running
    Syncing,
    /// Conflicts were surfaced; the merge is deferred until resolved
    AwaitingResolution,
    /// The last attempt failed; the next attempt may still run
    Error,
}

/// Result of a completed [`SyncService::run_sync`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync is in flight; nothing was fetched
    AlreadyInProgress,
    /// The merge was committed without conflicts
    Completed {
        /// Number of records the merge added to the collection
        added: usize,
    },
    /// Conflicts were detected; the commit is deferred until resolved
    ConflictsPending(Vec<Conflict>),
}

/// Counts reported after conflicts are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionSummary {
    /// Conflicts resolved in favor of the local record
    pub kept_local: usize,
    /// Conflicts resolved in favor of the remote record (the default)
    pub applied_server: usize,
}

#[derive(Debug)]
struct SyncLifecycle {
    status: SyncStatus,
    pending: Vec<Conflict>,
}

/// Clonable handle orchestrating the sync lifecycle against a remote source.
///
/// The fetch is the only suspension point; detection, merge, and commit run
/// to completion under the store lock once it resolves, so no interleaving
/// is visible mid-merge. Lock order is store before lifecycle whenever both
/// are needed.
#[derive(Clone)]
pub struct SyncService {
    store: SharedQuoteStore,
    fetcher: Arc<dyn RemoteFetcher>,
    lifecycle: Arc<Mutex<SyncLifecycle>>,
}

impl SyncService {
    /// Build a service over a shared store and remote fetcher.
    #[must_use]
    pub fn new(store: SharedQuoteStore, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self {
            store,
            fetcher,
            lifecycle: Arc::new(Mutex::new(SyncLifecycle {
                status: SyncStatus::Idle,
                pending: Vec::new(),
            })),
        }
    }

    /// Current lifecycle status.
    pub async fn status(&self) -> SyncStatus {
        self.lifecycle.lock().await.status
    }

    /// Conflicts waiting on a resolution, when any.
    pub async fn pending_conflicts(&self) -> Vec<Conflict> {
        self.lifecycle.lock().await.pending.clone()
    }

    /// Run one fetch/detect/merge pipeline.
    ///
    /// At most one pipeline is in flight: a call arriving while one runs
    /// reports [`SyncOutcome::AlreadyInProgress`] without fetching. A failed
    /// fetch leaves the status at [`SyncStatus::Error`], which does not
    /// block the next attempt.
    pub async fn run_sync(&self) -> Result<SyncOutcome> {
        {
            let mut lifecycle = self.lifecycle.lock().await;
            if lifecycle.status == SyncStatus::Syncing {
                tracing::debug!("Sync already in progress, skipping");
                return Ok(SyncOutcome::AlreadyInProgress);
            }
            lifecycle.status = SyncStatus::Syncing;
        }

        let remote = match self.fetcher.fetch().await {
            Ok(remote) => remote,
            Err(error) => {
                self.lifecycle.lock().await.status = SyncStatus::Error;
                tracing::warn!("Sync fetch failed: {error}");
                return Err(error);
            }
        };

        let mut store = self.store.lock().await;
        let conflicts = detect_conflicts(store.quotes(), &remote);

        if !conflicts.is_empty() {
            drop(store);
            let mut lifecycle = self.lifecycle.lock().await;
            lifecycle.pending.clone_from(&conflicts);
            lifecycle.status = SyncStatus::AwaitingResolution;
            tracing::info!("Sync found {} conflict(s), awaiting resolution", conflicts.len());
            return Ok(SyncOutcome::ConflictsPending(conflicts));
        }

        let before = store.len();
        let merged = merge_quotes(store.quotes(), &remote, &Resolutions::new());
        let added = merged.len().saturating_sub(before);
        let committed = store
            .replace_all(merged)
            .and_then(|()| store.record_sync_time(unix_timestamp_ms()));
        drop(store);

        self.lifecycle.lock().await.status = SyncStatus::Idle;
        committed?;

        tracing::info!("Sync completed, {added} new quote(s)");
        Ok(SyncOutcome::Completed { added })
    }

    /// Apply caller-supplied conflict resolutions.
    ///
    /// Valid only while conflicts are pending. The remote set is fetched
    /// again before merging: fresher data wins over reusing the snapshot
    /// the conflicts were detected against, at the cost of a second request
    /// (and the resolution outcome can differ when the remote changed in
    /// between). A failed re-fetch keeps the pending conflicts so the call
    /// can be retried.
    pub async fn resolve_conflicts(&self, resolutions: &Resolutions) -> Result<ResolutionSummary> {
        let pending = {
            let mut lifecycle = self.lifecycle.lock().await;
            if lifecycle.status != SyncStatus::AwaitingResolution {
                return Err(Error::NoPendingResolution);
            }
            lifecycle.status = SyncStatus::Syncing;
            std::mem::take(&mut lifecycle.pending)
        };

        let remote = match self.fetcher.fetch().await {
            Ok(remote) => remote,
            Err(error) => {
                let mut lifecycle = self.lifecycle.lock().await;
                lifecycle.pending = pending;
                lifecycle.status = SyncStatus::AwaitingResolution;
                tracing::warn!("Resolution fetch failed: {error}");
                return Err(error);
            }
        };

        let mut store = self.store.lock().await;
        let merged = merge_quotes(store.quotes(), &remote, resolutions);
        let committed = store
            .replace_all(merged)
            .and_then(|()| store.record_sync_time(unix_timestamp_ms()));
        drop(store);

        self.lifecycle.lock().await.status = SyncStatus::Idle;
        committed?;

        let summary = summarize(&pending, resolutions);
        tracing::info!(
            "Applied {} local and {} server version(s)",
            summary.kept_local,
            summary.applied_server
        );
        Ok(summary)
    }
}

fn summarize(pending: &[Conflict], resolutions: &Resolutions) -> ResolutionSummary {
    let kept_local = pending
        .iter()
        .filter(|conflict| resolutions.choice_for(conflict.id) == ResolutionChoice::Local)
        .count();
    ResolutionSummary {
        kept_local,
        applied_server: pending.len() - kept_local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quote, QuoteId};
    use crate::storage::MemoryStore;
    use crate::store::QuoteStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn quote(id: i64, text: &str, category: &str) -> Quote {
        Quote {
            id: QuoteId::new(id),
            text: text.to_string(),
            category: category.to_string(),
            last_modified: None,
            source: None,
        }
    }

    fn shared_store(quotes: Vec<Quote>) -> SharedQuoteStore {
        let mut store =
            QuoteStore::open(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new())).unwrap();
        store.replace_all(quotes).unwrap();
        Arc::new(Mutex::new(store))
    }

    /// Fetcher replaying a scripted sequence of responses.
    struct ScriptedFetcher {
        responses: std::sync::Mutex<VecDeque<Result<Vec<Quote>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<Result<Vec<Quote>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteFetcher for ScriptedFetcher {
        async fn fetch(&self) -> Result<Vec<Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Network("script exhausted".to_string())))
        }
    }

    /// Fetcher that parks until released, to hold a sync in flight.
    struct ParkedFetcher {
        release: Notify,
        calls: AtomicUsize,
    }

    impl ParkedFetcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                release: Notify::new(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RemoteFetcher for ParkedFetcher {
        async fn fetch(&self) -> Result<Vec<Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn sync_without_conflicts_commits_and_reports_added() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ScriptedFetcher::new(vec![Ok(vec![quote(1, "A", "X"), quote(2, "B", "Y")])]);
        let service = SyncService::new(store.clone(), fetcher);

        let outcome = service.run_sync().await.unwrap();
        assert_eq!(outcome, SyncOutcome::Completed { added: 1 });
        assert_eq!(service.status().await, SyncStatus::Idle);

        let store = store.lock().await;
        assert_eq!(store.quotes().to_vec(), vec![quote(1, "A", "X"), quote(2, "B", "Y")]);
        assert!(store.last_sync_time().is_some());
    }

    #[tokio::test]
    async fn conflicts_defer_the_commit() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ScriptedFetcher::new(vec![Ok(vec![quote(1, "B", "X")])]);
        let service = SyncService::new(store.clone(), fetcher);

        let outcome = service.run_sync().await.unwrap();
        let SyncOutcome::ConflictsPending(conflicts) = outcome else {
            panic!("expected pending conflicts, got {outcome:?}");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(service.status().await, SyncStatus::AwaitingResolution);
        assert_eq!(service.pending_conflicts().await, conflicts);

        // Nothing committed yet.
        assert_eq!(store.lock().await.quotes().to_vec(), vec![quote(1, "A", "X")]);
    }

    #[tokio::test]
    async fn resolving_with_local_choice_keeps_local_record() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ScriptedFetcher::new(vec![
            Ok(vec![quote(1, "B", "X")]),
            Ok(vec![quote(1, "B", "X")]),
        ]);
        let service = SyncService::new(store.clone(), fetcher.clone());

        service.run_sync().await.unwrap();
        let resolutions = Resolutions::from_iter([(QuoteId::new(1), ResolutionChoice::Local)]);
        let summary = service.resolve_conflicts(&resolutions).await.unwrap();

        assert_eq!(summary, ResolutionSummary { kept_local: 1, applied_server: 0 });
        assert_eq!(service.status().await, SyncStatus::Idle);
        assert!(service.pending_conflicts().await.is_empty());
        assert_eq!(store.lock().await.quotes().to_vec(), vec![quote(1, "A", "X")]);
        // Resolution re-fetches rather than reusing the detection snapshot.
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn resolving_with_default_applies_server_version() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ScriptedFetcher::new(vec![
            Ok(vec![quote(1, "B", "X")]),
            Ok(vec![quote(1, "B", "X")]),
        ]);
        let service = SyncService::new(store.clone(), fetcher);

        service.run_sync().await.unwrap();
        let summary = service.resolve_conflicts(&Resolutions::new()).await.unwrap();

        assert_eq!(summary, ResolutionSummary { kept_local: 0, applied_server: 1 });
        assert_eq!(store.lock().await.quotes().to_vec(), vec![quote(1, "B", "X")]);
    }

    #[tokio::test]
    async fn run_sync_while_in_flight_skips_without_fetching() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ParkedFetcher::new();
        let service = SyncService::new(store.clone(), fetcher.clone());

        let in_flight = tokio::spawn({
            let service = service.clone();
            async move { service.run_sync().await }
        });

        // Wait for the first pipeline to reach its fetch.
        while fetcher.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(service.status().await, SyncStatus::Syncing);

        let outcome = service.run_sync().await.unwrap();
        assert_eq!(outcome, SyncOutcome::AlreadyInProgress);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.lock().await.quotes().to_vec(), vec![quote(1, "A", "X")]);

        fetcher.release.notify_one();
        in_flight.await.unwrap().unwrap();
        assert_eq!(service.status().await, SyncStatus::Idle);
    }

    #[tokio::test]
    async fn fetch_failure_sets_error_status_without_blocking_retry() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ScriptedFetcher::new(vec![
            Err(Error::Network("connection refused".to_string())),
            Ok(vec![quote(2, "B", "Y")]),
        ]);
        let service = SyncService::new(store.clone(), fetcher);

        let error = service.run_sync().await.unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert_eq!(service.status().await, SyncStatus::Error);
        assert_eq!(store.lock().await.len(), 1);

        // The next attempt proceeds and commits.
        let outcome = service.run_sync().await.unwrap();
        assert_eq!(outcome, SyncOutcome::Completed { added: 1 });
        assert_eq!(service.status().await, SyncStatus::Idle);
    }

    #[tokio::test]
    async fn resolve_outside_awaiting_resolution_is_rejected() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ScriptedFetcher::new(vec![]);
        let service = SyncService::new(store, fetcher);

        let error = service.resolve_conflicts(&Resolutions::new()).await.unwrap_err();
        assert!(matches!(error, Error::NoPendingResolution));
    }

    #[tokio::test]
    async fn failed_resolution_refetch_keeps_conflicts_pending() {
        let store = shared_store(vec![quote(1, "A", "X")]);
        let fetcher = ScriptedFetcher::new(vec![
            Ok(vec![quote(1, "B", "X")]),
            Err(Error::Network("connection refused".to_string())),
            Ok(vec![quote(1, "B", "X")]),
        ]);
        let service = SyncService::new(store.clone(), fetcher);

        service.run_sync().await.unwrap();
        let error = service.resolve_conflicts(&Resolutions::new()).await.unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert_eq!(service.status().await, SyncStatus::AwaitingResolution);
        assert_eq!(service.pending_conflicts().await.len(), 1);

        // The retry succeeds with the conflicts still pending.
        let summary = service.resolve_conflicts(&Resolutions::new()).await.unwrap();
        assert_eq!(summary.applied_server, 1);
        assert_eq!(store.lock().await.quotes().to_vec(), vec![quote(1, "B", "X")]);
    }

    #[tokio::test]
    async fn eight_fresh_remote_records_all_append() {
        let store = shared_store(Vec::new());
        let remote: Vec<Quote> = (1..=8).map(|id| quote(id, "Q", "X")).collect();
        let fetcher = ScriptedFetcher::new(vec![Ok(remote.clone())]);
        let service = SyncService::new(store.clone(), fetcher);

        let outcome = service.run_sync().await.unwrap();
        assert_eq!(outcome, SyncOutcome::Completed { added: 8 });
        assert_eq!(store.lock().await.quotes().to_vec(), remote);
    }
}
