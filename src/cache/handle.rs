//! Cache Handle Module
//!
//! The externally-visible cache object. It owns a [`Store`] and, when a
//! cleanup interval is configured, the background sweeper bound to it, and
//! ties their lifecycles together: dropping the handle stops the sweeper.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::entry::{Entry, Ttl};
use super::store::{EvictionHook, Store};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::persist;
use crate::tasks::{spawn_sweeper, SnapshotFn, SweeperHandle};

// == Cache ==
/// A thread-safe in-process cache with per-entry TTL expiration.
///
/// All operations delegate to the owned [`Store`]; share a cache across
/// threads or tasks by wrapping it in an [`Arc`].
pub struct Cache<V> {
    store: Arc<Store<V>>,
    sweeper: Option<SweeperHandle>,
}

impl<V> Cache<V>
where
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache with the given default TTL and, when
    /// `cleanup_interval` is set, a background sweeper waking on that
    /// interval.
    ///
    /// Must be called from within a tokio runtime when `cleanup_interval`
    /// is set.
    pub fn new(default_ttl: Option<Duration>, cleanup_interval: Option<Duration>) -> Self {
        let config = CacheConfig {
            default_ttl,
            cleanup_interval,
            snapshot_dir: None,
        };
        Self::build(config, None)
    }

    fn build(config: CacheConfig, snapshot: Option<SnapshotFn<V>>) -> Self {
        let store = Arc::new(Store::new(config.default_ttl));
        let sweeper = config
            .cleanup_interval
            .map(|interval| spawn_sweeper(Arc::clone(&store), interval, snapshot));
        Self { store, sweeper }
    }
}

impl<V> Cache<V> {
    /// Inserts or unconditionally overwrites an entry. See [`Store::set`].
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Ttl) {
        self.store.set(key, value, ttl);
    }

    /// `set` with the cache's default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.store.set_default(key, value);
    }

    /// Inserts only if the key is absent or expired. See [`Store::add`].
    pub fn add(&self, key: impl Into<String>, value: V, ttl: Ttl) -> Result<()>
    where
        V: fmt::Debug,
    {
        self.store.add(key, value, ttl)
    }

    /// Overwrites only if a live entry exists. See [`Store::replace`].
    pub fn replace(&self, key: impl Into<String>, value: V, ttl: Ttl) -> Result<()> {
        self.store.replace(key, value, ttl)
    }

    /// Removes an entry unconditionally. See [`Store::delete`].
    pub fn delete(&self, key: &str) {
        self.store.delete(key);
    }

    /// Purges every expired entry, returning the number removed.
    pub fn delete_expired(&self) -> usize {
        self.store.delete_expired()
    }

    /// Installs, replaces or disables the eviction hook.
    pub fn on_evicted(&self, hook: Option<EvictionHook<V>>) {
        self.store.on_evicted(hook);
    }

    /// Raw entry count, unswept expired entries included.
    pub fn item_count(&self) -> usize {
        self.store.item_count()
    }

    /// Clears every entry without firing the eviction hook.
    pub fn flush(&self) {
        self.store.flush();
    }

    /// Stops the background sweeper ahead of drop. Idempotent; a no-op for
    /// a cache built without a cleanup interval.
    pub fn stop_sweeper(&mut self) {
        if let Some(mut sweeper) = self.sweeper.take() {
            sweeper.shutdown();
        }
    }
}

impl<V: Clone> Cache<V> {
    /// Returns the value for a key, `None` when absent or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.get(key)
    }

    /// As `get`, with the absolute expiration instant (`None` = never).
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<SystemTime>)> {
        self.store.get_with_expiration(key)
    }

    /// A copy of every non-expired entry.
    pub fn items(&self) -> HashMap<String, Entry<V>> {
        self.store.items()
    }
}

impl<V> Cache<V>
where
    V: Serialize + Send + Sync + 'static,
{
    /// Creates a cache from a full [`CacheConfig`].
    ///
    /// When both `cleanup_interval` and `snapshot_dir` are set, the sweeper
    /// snapshots the entry set into that directory before each purge pass;
    /// snapshot failures are logged and never stop the sweep.
    pub fn with_config(config: CacheConfig) -> Self {
        let snapshot = config.snapshot_dir.clone().map(|dir| -> SnapshotFn<V> {
            Box::new(move |store| persist::save(store, Some(&dir)))
        });
        Self::build(config, snapshot)
    }
}

impl<V: Serialize> Cache<V> {
    /// Snapshots the raw entry set into `dir` (the working directory when
    /// `None`). Holds the shared lock across the file writes; avoid calling
    /// this on a latency-sensitive path.
    pub fn save(&self, dir: Option<&Path>) -> Result<()> {
        persist::save(&self.store, dir)
    }
}

impl<V: DeserializeOwned> Cache<V> {
    /// Decodes a snapshot file and merges it into the cache. Live entries
    /// win over the snapshot; absent or expired keys take the snapshot's
    /// value.
    pub fn load_file(&self, path: &Path) -> Result<()> {
        persist::load(&self.store, path)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_delegates_core_operations() {
        let cache: Cache<String> = Cache::new(None, None);

        cache.set("key1", "value1".to_string(), Ttl::Never);
        assert_eq!(cache.get("key1"), Some("value1".to_string()));

        cache.add("key2", "value2".to_string(), Ttl::Never).unwrap();
        assert!(cache.add("key2", "other".to_string(), Ttl::Never).is_err());

        cache.replace("key2", "replaced".to_string(), Ttl::Never).unwrap();
        assert_eq!(cache.get("key2"), Some("replaced".to_string()));

        assert_eq!(cache.items().len(), 2);
        assert_eq!(cache.item_count(), 2);

        cache.delete("key1");
        assert_eq!(cache.get("key1"), None);

        cache.flush();
        assert_eq!(cache.item_count(), 0);
    }

    #[test]
    fn test_cache_default_ttl_applies_to_set_default() {
        let cache = Cache::new(Some(Duration::from_millis(30)), None);

        cache.set_default("short", 1u32);
        cache.set("pinned", 2u32, Ttl::Never);

        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("pinned"), Some(2));
        assert_eq!(cache.delete_expired(), 1);
    }

    #[tokio::test]
    async fn test_cache_sweeper_purges_in_background() {
        let cache = Cache::new(None, Some(Duration::from_millis(40)));

        cache.set("expire_soon", 1u32, Ttl::After(Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.item_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_stop_sweeper_is_idempotent() {
        let mut cache: Cache<u32> = Cache::new(None, Some(Duration::from_millis(40)));

        cache.stop_sweeper();
        cache.stop_sweeper();

        cache.set("expire_soon", 1u32, Ttl::After(Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Sweeper is gone; only lazy expiration applies.
        assert_eq!(cache.item_count(), 1);
        assert_eq!(cache.get("expire_soon"), None);
    }
}
