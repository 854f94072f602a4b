//! Single-owner snapshot cache with coalesced, stale-while-revalidate refreshes

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::database::SnapshotStore;
use crate::error::IndexerError;
use crate::metrics::{self, RefreshOutcome};
use crate::snapshot::{Snapshot, SnapshotBuilder};

type RefreshFuture = Shared<BoxFuture<'static, Result<Arc<Snapshot>, IndexerError>>>;

/// Owns the current snapshot.
///
/// Readers get an `Arc` to a complete snapshot; a new one is built off to the
/// side and published with a single pointer swap. At most one rebuild runs at
/// a time and every concurrent request for one joins it.
pub struct SnapshotCache {
    builder: SnapshotBuilder,
    current: ArcSwapOption<Snapshot>,
    in_flight: Mutex<Option<RefreshFuture>>,
    freshness: Duration,
    store: Option<SnapshotStore>,
}

impl SnapshotCache {
    pub fn new(builder: SnapshotBuilder, freshness: Duration) -> Self {
        Self {
            builder,
            current: ArcSwapOption::empty(),
            in_flight: Mutex::new(None),
            freshness,
            store: None,
        }
    }

    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn store(&self) -> Option<&SnapshotStore> {
        self.store.as_ref()
    }

    /// Current snapshot without triggering any I/O
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Seed an empty cache from the persisted store. Returns whether a snapshot was loaded.
    pub async fn restore(&self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    "Restored persisted snapshot generated at {}",
                    snapshot.generated_at
                );
                self.current
                    .compare_and_swap(&None::<Arc<Snapshot>>, Some(Arc::new(snapshot)));
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read persisted snapshot: {:#}", e);
                false
            }
        }
    }

    /// Serve the current snapshot.
    ///
    /// Empty: build synchronously. Stale: serve as-is and rebuild in the background.
    pub async fn get(self: &Arc<Self>) -> Result<Arc<Snapshot>, IndexerError> {
        match self.current.load_full() {
            Some(snapshot) => {
                if self.is_stale(&snapshot) {
                    debug!("Snapshot is stale, revalidating in background");
                    self.spawn_refresh();
                }
                Ok(snapshot)
            }
            None => self.refresh().await,
        }
    }

    fn is_stale(&self, snapshot: &Snapshot) -> bool {
        let age = Utc::now().signed_duration_since(snapshot.generated_at);
        age.to_std().map(|age| age > self.freshness).unwrap_or(false)
    }

    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            // Failures are logged inside the rebuild
            let _ = this.refresh().await;
        })
    }

    /// Rebuild now, or join the rebuild already in flight
    pub async fn refresh(self: &Arc<Self>) -> Result<Arc<Snapshot>, IndexerError> {
        let fut = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(fut) => {
                    metrics::record_refresh_joined();
                    fut.clone()
                }
                None => {
                    let this = Arc::clone(self);
                    let fut = async move { this.rebuild().await }.boxed().shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };
        fut.await
    }

    async fn rebuild(self: Arc<Self>) -> Result<Arc<Snapshot>, IndexerError> {
        let previous = self.current.load_full();
        let result = self.builder.build(previous.as_deref()).await.map(Arc::new);

        match &result {
            Ok(snapshot) => {
                self.current.store(Some(Arc::clone(snapshot)));
                metrics::record_refresh(RefreshOutcome::Success);
                self.persist(Arc::clone(snapshot));
            }
            Err(e) => {
                metrics::record_refresh(RefreshOutcome::Failure);
                if previous.is_some() {
                    warn!("Snapshot refresh failed, still serving previous snapshot: {}", e);
                } else {
                    warn!("Snapshot refresh failed with no snapshot to fall back on: {}", e);
                }
            }
        }

        // Clear before resolving so later requests start a fresh rebuild
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        result
    }

    fn persist(&self, snapshot: Arc<Snapshot>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = store.save(&snapshot).await {
                warn!("Failed to persist snapshot: {:#}", e);
            }
        });
    }
}

/// Rebuild on a fixed period regardless of read traffic.
///
/// The first tick fires immediately, which warms the cache at startup.
pub fn spawn_refresh_loop(cache: Arc<SnapshotCache>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match cache.refresh().await {
                Ok(snapshot) => debug!(
                    "Scheduled refresh finished ({} projects)",
                    snapshot.projects.len()
                ),
                Err(e) => warn!("Scheduled refresh failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProgramSet, RefreshPolicy};
    use crate::decoder::fixtures::project;
    use crate::rpc::RpcClient;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn rpc_body(pledges: &[u64]) -> serde_json::Value {
        let result: Vec<_> = pledges
            .iter()
            .enumerate()
            .map(|(i, pledged)| {
                let account = project(i as u64, *pledged, 0);
                json!({
                    "pubkey": account.pubkey,
                    "account": { "data": [STANDARD.encode(&account.data), "base64"], "lamports": 1 }
                })
            })
            .collect();
        json!({ "jsonrpc": "2.0", "id": "getProgramAccounts", "result": result })
    }

    fn cache(server: &MockServer, freshness: Duration) -> Arc<SnapshotCache> {
        let rpc = RpcClient::new(server.url("/"), Duration::from_secs(5)).unwrap();
        let builder = SnapshotBuilder::new(
            rpc,
            ProgramSet::projects_only("Fund111"),
            RefreshPolicy::FailFast,
        );
        Arc::new(SnapshotCache::new(builder, freshness))
    }

    #[tokio::test]
    async fn test_cold_read_builds_synchronously() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(rpc_body(&[10, 20]));
            })
            .await;

        let cache = cache(&server, Duration::from_secs(60));
        assert!(cache.peek().is_none());
        let snapshot = cache.get().await.unwrap();
        assert_eq!(snapshot.projects.len(), 2);
        mock.assert_hits_async(1).await;

        // Fresh: served without I/O and without a new snapshot
        let again = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&snapshot, &again));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_rebuild() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(rpc_body(&[1, 2, 3]));
            })
            .await;

        let cache = cache(&server, Duration::from_secs(60));
        let readers: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await })
            })
            .collect();

        let mut snapshots = Vec::new();
        for reader in readers {
            snapshots.push(reader.await.unwrap().unwrap());
        }

        mock.assert_hits_async(1).await;
        assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
        assert_eq!(snapshots[0].projects.len(), 3);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_served_while_revalidating() {
        let server = MockServer::start_async().await;
        let mut first = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(rpc_body(&[5]));
            })
            .await;

        let cache = cache(&server, Duration::ZERO);
        let old = cache.get().await.unwrap();
        first.delete_async().await;

        let second = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .delay(Duration::from_millis(200))
                    .json_body(rpc_body(&[5, 6]));
            })
            .await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        let served = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&old, &served), "stale snapshot must be served immediately");

        // Joins the background rebuild rather than starting another
        let fresh = cache.refresh().await.unwrap();
        assert_eq!(fresh.projects.len(), 2);
        second.assert_hits_async(1).await;
        assert!(Arc::ptr_eq(&cache.peek().unwrap(), &fresh));
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_snapshot() {
        let server = MockServer::start_async().await;
        let mut ok = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(rpc_body(&[7]));
            })
            .await;

        let cache = cache(&server, Duration::from_secs(60));
        let built = cache.refresh().await.unwrap();
        ok.delete_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(502);
            })
            .await;

        let err = cache.refresh().await.unwrap_err();
        assert!(matches!(err, IndexerError::Network(_)));
        assert!(Arc::ptr_eq(&cache.peek().unwrap(), &built));
        assert!(Arc::ptr_eq(&cache.get().await.unwrap(), &built));
    }

    #[tokio::test]
    async fn test_cold_failure_surfaces_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .json_body(json!({ "jsonrpc": "2.0", "error": { "code": -1, "message": "down" } }));
            })
            .await;

        let cache = cache(&server, Duration::from_secs(60));
        let err = cache.get().await.unwrap_err();
        assert_eq!(err, IndexerError::Protocol("RPC error -1: down".into()));
        assert!(cache.peek().is_none());
    }

    #[tokio::test]
    async fn test_restore_and_persist_through_store() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(rpc_body(&[11, 12]));
            })
            .await;

        let store = SnapshotStore::open(":memory:", Duration::from_secs(60))
            .await
            .unwrap();
        let rpc = RpcClient::new(server.url("/"), Duration::from_secs(5)).unwrap();
        let builder = SnapshotBuilder::new(
            rpc,
            ProgramSet::projects_only("Fund111"),
            RefreshPolicy::FailFast,
        );
        let cache = Arc::new(SnapshotCache::new(builder, Duration::from_secs(60)).with_store(store.clone()));

        assert!(!cache.restore().await);
        let built = cache.refresh().await.unwrap();

        // Persistence is spawned; give it a moment
        let mut persisted = None;
        for _ in 0..50 {
            persisted = store.load().await.unwrap();
            if persisted.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(persisted.as_ref(), Some(built.as_ref()));

        let rpc = RpcClient::new(server.url("/"), Duration::from_secs(5)).unwrap();
        let builder = SnapshotBuilder::new(
            rpc,
            ProgramSet::projects_only("Fund111"),
            RefreshPolicy::FailFast,
        );
        let restarted = Arc::new(SnapshotCache::new(builder, Duration::from_secs(60)).with_store(store));
        assert!(restarted.restore().await);
        assert_eq!(restarted.get().await.unwrap().as_ref(), built.as_ref());
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_refresh_loop_rebuilds_without_readers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(rpc_body(&[1]));
            })
            .await;

        let cache = cache(&server, Duration::from_secs(60));
        let handle = spawn_refresh_loop(Arc::clone(&cache), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(180)).await;
        handle.abort();

        assert!(cache.peek().is_some());
        assert!(mock.hits_async().await >= 2);
    }
}
