//! Connectivity flag, the poller that feeds it, and the reconnect trigger.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::engine::{DrainOutcome, SyncEngine};
use crate::remote::RemoteStore;
use crate::services::LocalStore;

/// Observable online/offline flag shared by the write path and the orchestrator.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update the flag. Returns `true` when the value actually changed.
    pub fn set_online(&self, online: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Probe the remote store every `interval` and publish the result until `shutdown` resolves.
pub async fn poll_connectivity<R: RemoteStore>(
    remote: &R,
    connectivity: &Connectivity,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                let online = remote.probe().await.is_ok();
                if connectivity.set_online(online) {
                    tracing::info!(online, "Connectivity changed");
                }
            }
        }
    }
}

/// Run one debounced drain per offline→online transition until `shutdown` resolves.
///
/// A transition that flips back offline during the delay does not drain.
pub async fn sync_on_reconnect<L: LocalStore, R: RemoteStore>(
    engine: &SyncEngine<L, R>,
    delay: Duration,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut online = engine.connectivity().subscribe();
    let mut was_online = *online.borrow_and_update();

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = online.changed() => {
                if changed.is_err() {
                    break;
                }
                let now_online = *online.borrow_and_update();
                let reconnected = now_online && !was_online;
                was_online = now_online;
                if !reconnected {
                    continue;
                }

                tokio::time::sleep(delay).await;
                if !engine.connectivity().is_online() {
                    tracing::debug!("Went offline again before the sync delay elapsed");
                    continue;
                }

                match engine.drain().await {
                    Ok(DrainOutcome::Completed(report)) => {
                        tracing::debug!(?report, "Reconnect sync finished");
                    }
                    Ok(outcome) => tracing::debug!(?outcome, "Reconnect sync skipped"),
                    Err(error) => tracing::warn!("Reconnect sync failed: {error}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemoteStore;
    use crate::services::DatabaseService;
    use crate::Todo;

    #[test]
    fn set_online_reports_transitions_only() {
        let connectivity = Connectivity::new(false);
        assert!(!connectivity.is_online());
        assert!(connectivity.set_online(true));
        assert!(!connectivity.set_online(true));
        assert!(connectivity.is_online());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn poller_tracks_remote_availability() {
        let remote = MemoryRemoteStore::new();
        let connectivity = Connectivity::new(false);

        poll_connectivity(
            &remote,
            &connectivity,
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;
        assert!(connectivity.is_online());

        remote.set_available(false).await;
        poll_connectivity(
            &remote,
            &connectivity,
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;
        assert!(!connectivity.is_online());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconnect_drains_the_queue_once() {
        let local = DatabaseService::open_in_memory().await.unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = SyncEngine::new(local, remote.clone(), Connectivity::new(false));

        engine.writer().create_todo("offline item").await.unwrap();
        assert_eq!(engine.local().pending_count().await.unwrap(), 1);

        let trigger = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            engine.connectivity().set_online(true);
            tokio::time::sleep(Duration::from_millis(200)).await;
        };
        sync_on_reconnect(&engine, Duration::from_millis(10), trigger).await;

        assert_eq!(engine.local().pending_count().await.unwrap(), 0);
        let titles = remote
            .snapshot()
            .await
            .into_iter()
            .map(|todo: Todo| todo.title)
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["offline item".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dropping_offline_during_the_delay_skips_the_drain() {
        let local = DatabaseService::open_in_memory().await.unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = SyncEngine::new(local, remote.clone(), Connectivity::new(false));

        engine.writer().create_todo("still offline").await.unwrap();

        let trigger = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            engine.connectivity().set_online(true);
            tokio::time::sleep(Duration::from_millis(10)).await;
            engine.connectivity().set_online(false);
            tokio::time::sleep(Duration::from_millis(300)).await;
        };
        sync_on_reconnect(&engine, Duration::from_millis(100), trigger).await;

        assert_eq!(engine.local().pending_count().await.unwrap(), 1);
        assert!(remote.snapshot().await.is_empty());
        assert_eq!(remote.write_calls().await, 0);
        assert!(engine.last_report().await.is_none());
    }
}
