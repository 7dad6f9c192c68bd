//! Cache Store Module
//!
//! The concurrent entry store: a key/value map guarded by a single
//! reader/writer lock, with lazy TTL expiration and eviction notification.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime};

use super::entry::{now_nanos, Entry, Ttl, NO_EXPIRATION};
use crate::error::{CacheError, Result};

/// Callback invoked with the key and removed value when an entry is evicted
/// by `delete` or `delete_expired`. Never invoked on `flush` or on overwrite
/// via `set`.
pub type EvictionHook<V> = Arc<dyn Fn(&str, V) + Send + Sync>;

// == Cache Store ==
/// Thread-safe entry store with per-entry TTL expiration.
///
/// Reads acquire the shared lock, structural mutations the exclusive lock,
/// and the lock is never held across I/O or a hook invocation. Expired
/// entries read as absent even before a sweep physically removes them.
pub struct Store<V> {
    /// Key-value storage behind the single reader/writer lock
    entries: RwLock<HashMap<String, Entry<V>>>,
    /// TTL substituted for `Ttl::Default`; `None` = no default expiration
    default_ttl: Option<Duration>,
    /// Optional eviction callback, kept outside the entries lock so it can
    /// be invoked after that lock is released
    on_evicted: RwLock<Option<EvictionHook<V>>>,
}

impl<V> Store<V> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL applied when entries are stored with
    ///   [`Ttl::Default`]; `None` means such entries never expire
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            on_evicted: RwLock::new(None),
        }
    }

    // A poisoned lock only means another thread panicked mid-operation;
    // the map itself is always structurally valid, so poisoning is absorbed.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn eviction_hook(&self) -> Option<EvictionHook<V>> {
        self.on_evicted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolves a [`Ttl`] into an absolute expiration timestamp.
    fn expiration_for(&self, ttl: Ttl) -> i64 {
        let duration = match ttl {
            Ttl::After(duration) => duration,
            Ttl::Default => match self.default_ttl {
                Some(duration) => duration,
                None => return NO_EXPIRATION,
            },
            Ttl::Never => return NO_EXPIRATION,
        };
        now_nanos() + duration.as_nanos() as i64
    }

    // == Set ==
    /// Inserts or unconditionally overwrites an entry.
    ///
    /// Overwriting never fires the eviction hook.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Ttl) {
        let expires_at = self.expiration_for(ttl);
        let mut entries = self.write_entries();
        entries.insert(key.into(), Entry::new(value, expires_at));
    }

    /// `set` with the cache's default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, Ttl::Default);
    }

    // == Add ==
    /// Inserts only if the key is absent or holds an expired entry.
    ///
    /// Fails with [`CacheError::KeyExists`] when a live entry is present,
    /// carrying that entry's value. The existence check and the insert share
    /// a single exclusive-lock acquisition; the check reads the guarded map
    /// directly instead of re-entering `get`, which would re-acquire the
    /// lock.
    pub fn add(&self, key: impl Into<String>, value: V, ttl: Ttl) -> Result<()>
    where
        V: fmt::Debug,
    {
        let key = key.into();
        let expires_at = self.expiration_for(ttl);
        let mut entries = self.write_entries();
        if let Some(existing) = entries.get(&key) {
            if !existing.is_expired() {
                return Err(CacheError::KeyExists {
                    current: format!("{:?}", existing.value),
                    key,
                });
            }
        }
        entries.insert(key, Entry::new(value, expires_at));
        Ok(())
    }

    // == Replace ==
    /// Overwrites only if a live entry already exists for the key.
    ///
    /// Fails with [`CacheError::KeyNotFound`] when the key is absent or its
    /// entry has expired. Same single-critical-section rule as `add`.
    pub fn replace(&self, key: impl Into<String>, value: V, ttl: Ttl) -> Result<()> {
        let key = key.into();
        let expires_at = self.expiration_for(ttl);
        let mut entries = self.write_entries();
        match entries.get(&key) {
            Some(existing) if !existing.is_expired() => {
                entries.insert(key, Entry::new(value, expires_at));
                Ok(())
            }
            _ => Err(CacheError::KeyNotFound { key }),
        }
    }

    // == Delete ==
    /// Removes an entry unconditionally; absent keys are a no-op.
    ///
    /// When an eviction hook is installed and the key was present, the hook
    /// fires with the removed value after the write lock has been released,
    /// so a hook may re-enter the store without deadlocking.
    pub fn delete(&self, key: &str) {
        let removed = self.write_entries().remove(key);
        if let Some(entry) = removed {
            if let Some(hook) = self.eviction_hook() {
                hook(key, entry.value);
            }
        }
    }

    // == Delete Expired ==
    /// Removes every expired entry and returns the number removed.
    ///
    /// One cutoff instant is applied to the whole scan. Removed entries are
    /// collected under the write lock; the eviction hook then fires once per
    /// entry, in arbitrary order, after the lock is released. This is the
    /// bulk sweep path the background sweeper calls.
    pub fn delete_expired(&self) -> usize {
        let now = now_nanos();
        let mut evicted = Vec::new();
        {
            let mut entries = self.write_entries();
            let expired: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                if let Some(entry) = entries.remove(&key) {
                    evicted.push((key, entry.value));
                }
            }
        }

        let removed = evicted.len();
        if let Some(hook) = self.eviction_hook() {
            for (key, value) in evicted {
                hook(&key, value);
            }
        }
        removed
    }

    // == Eviction Hook ==
    /// Installs, replaces or (with `None`) disables the eviction hook.
    ///
    /// Installing a new hook races harmlessly with in-flight invocations of
    /// the old one; this is a diagnostic facility, not a transactional one.
    pub fn on_evicted(&self, hook: Option<EvictionHook<V>>) {
        *self
            .on_evicted
            .write()
            .unwrap_or_else(PoisonError::into_inner) = hook;
    }

    // == Item Count ==
    /// Number of entries physically stored, including expired entries the
    /// sweeper has not reclaimed yet. This raw count can exceed the size of
    /// the filtered view `items` returns.
    pub fn item_count(&self) -> usize {
        self.read_entries().len()
    }

    // == Flush ==
    /// Removes every entry. The eviction hook is never fired by a flush.
    pub fn flush(&self) {
        self.write_entries().clear();
    }

    /// Runs `f` against the raw entry map under the shared lock.
    ///
    /// Snapshots serialize through here, so they see the same raw map
    /// `item_count` counts, and the lock is held for as long as `f` runs.
    pub(crate) fn with_entries<R>(&self, f: impl FnOnce(&HashMap<String, Entry<V>>) -> R) -> R {
        let entries = self.read_entries();
        f(&entries)
    }

    /// Merges a decoded snapshot into the store and returns how many entries
    /// were installed.
    ///
    /// A decoded entry is installed only where the store has no entry for
    /// the key or the stored entry has expired; live entries always win.
    /// This lets a restarted process recover state without clobbering keys
    /// set during the startup window.
    pub(crate) fn merge(&self, incoming: HashMap<String, Entry<V>>) -> usize {
        let mut entries = self.write_entries();
        let mut installed = 0;
        for (key, entry) in incoming {
            match entries.get(&key) {
                Some(existing) if !existing.is_expired() => {}
                _ => {
                    entries.insert(key, entry);
                    installed += 1;
                }
            }
        }
        installed
    }
}

impl<V: Clone> Store<V> {
    // == Get ==
    /// Returns the value for a key, or `None` when the key is absent or its
    /// entry has expired.
    ///
    /// Expiration is lazy: an expired entry the sweeper has not removed yet
    /// still reads as absent, and the read does not mutate the store.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.read_entries();
        let entry = entries.get(key)?;
        if entry.is_expired() {
            return None;
        }
        Some(entry.value.clone())
    }

    // == Get With Expiration ==
    /// As `get`, additionally returning the absolute expiration instant, or
    /// `None` for an entry that never expires.
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<SystemTime>)> {
        let entries = self.read_entries();
        let entry = entries.get(key)?;
        if entry.is_expired() {
            return None;
        }
        Some((entry.value.clone(), entry.expiration_time()))
    }

    // == Items ==
    /// Returns a copy of every non-expired entry.
    ///
    /// The copy keeps callers away from the live map; expired-but-unswept
    /// entries are filtered out, unlike `item_count`.
    pub fn items(&self) -> HashMap<String, Entry<V>> {
        let entries = self.read_entries();
        let now = now_nanos();
        entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }
}
