//! Background Sweeper Task
//!
//! Periodically purges expired cache entries, optionally snapshotting the
//! entry set to disk first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::Store;
use crate::error::Result;

/// Snapshot step run before each purge pass. Built by the cache handle so
/// the serialization bound stays out of the sweeper itself.
pub(crate) type SnapshotFn<V> = Box<dyn Fn(&Store<V>) -> Result<()> + Send>;

// == Sweeper Handle ==
/// Owns a running sweeper task.
///
/// Dropping the handle stops the task: the stop signal lets an idle sweeper
/// exit its timer cleanly, and the abort covers a runtime that is no longer
/// polling it. The task never holds a lock or does I/O across an await
/// point, so aborting cannot cut a sweep in half.
pub(crate) struct SweeperHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweeper. Safe to call more than once.
    pub(crate) fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.abort();
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// == Spawn ==
/// Spawns the background sweeper for a store.
///
/// On each tick the task first runs the snapshot step, when one is
/// configured, then purges expired entries. Snapshot failures are logged
/// and never stop the sweep loop. Exactly one sweeper exists per cache
/// instance; it runs until its handle is shut down or dropped.
///
/// Must be called from within a tokio runtime.
pub(crate) fn spawn_sweeper<V>(
    store: Arc<Store<V>>,
    interval: Duration,
    snapshot: Option<SnapshotFn<V>>,
) -> SweeperHandle
where
    V: Send + Sync + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        debug!(interval_ms = interval.as_millis() as u64, "sweeper started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Some(snapshot) = &snapshot {
                        if let Err(error) = snapshot(&store) {
                            warn!(%error, "snapshot before sweep failed");
                        }
                    }
                    let removed = store.delete_expired();
                    if removed > 0 {
                        debug!(removed, "sweeper purged expired entries");
                    }
                }
                _ = &mut stop_rx => {
                    debug!("sweeper stopped");
                    break;
                }
            }
        }
    });

    SweeperHandle {
        stop: Some(stop_tx),
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Ttl;
    use std::io;

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let store = Arc::new(Store::new(None));
        store.set("expire_soon", 1u32, Ttl::After(Duration::from_millis(30)));
        store.set("long_lived", 2u32, Ttl::After(Duration::from_secs(60)));

        let mut handle = spawn_sweeper(Arc::clone(&store), Duration::from_millis(50), None);

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.get("expire_soon"), None);
        assert_eq!(store.get("long_lived"), Some(2));
        assert_eq!(store.item_count(), 1, "expired entry physically removed");

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_sweeper_runs_snapshot_before_purge() {
        let store = Arc::new(Store::new(None));
        store.set("expire_soon", 1u32, Ttl::After(Duration::from_millis(30)));

        let snapshots = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = Arc::clone(&snapshots);
        let snapshot: SnapshotFn<u32> = Box::new(move |store| {
            // Runs before the purge, so the expired entry is still visible.
            log.lock().unwrap().push(store.item_count());
            Ok(())
        });

        let mut handle =
            spawn_sweeper(Arc::clone(&store), Duration::from_millis(50), Some(snapshot));

        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.shutdown();

        let snapshots = snapshots.lock().unwrap();
        assert!(!snapshots.is_empty());
        assert_eq!(snapshots[0], 1, "first snapshot sees the unswept entry");
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_continues_when_snapshot_fails() {
        let store = Arc::new(Store::new(None));
        store.set("expire_soon", 1u32, Ttl::After(Duration::from_millis(30)));

        let snapshot: SnapshotFn<u32> = Box::new(|_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "disk unavailable").into())
        });

        let mut handle =
            spawn_sweeper(Arc::clone(&store), Duration::from_millis(50), Some(snapshot));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.item_count(), 0, "purge still ran after snapshot errors");

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store: Arc<Store<u32>> = Arc::new(Store::new(None));

        let mut handle = spawn_sweeper(store, Duration::from_secs(3600), None);
        handle.shutdown();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_drop() {
        let store: Arc<Store<u32>> = Arc::new(Store::new(None));
        store.set("expire_soon", 1u32, Ttl::After(Duration::from_millis(10)));

        drop(spawn_sweeper(Arc::clone(&store), Duration::from_millis(20), None));

        // Dropped before the first tick: nothing should ever be swept.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.item_count(), 1);
    }
}
