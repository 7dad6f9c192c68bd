//! Configuration Module
//!
//! Construction parameters for a cache instance.

use std::path::PathBuf;
use std::time::Duration;

/// Cache construction parameters.
///
/// This is a library-level component: configuration is supplied by the
/// embedding program, never read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// TTL substituted when an entry is stored with [`Ttl::Default`].
    /// `None` means entries without an explicit TTL never expire.
    ///
    /// [`Ttl::Default`]: crate::Ttl::Default
    pub default_ttl: Option<Duration>,
    /// Wake-up period of the background sweeper. `None` disables the
    /// sweeper; expired entries are then reclaimed only by explicit
    /// `delete_expired` calls (reads still treat them as absent).
    pub cleanup_interval: Option<Duration>,
    /// Directory the sweeper snapshots the entry set into before each
    /// purge pass. `None` disables snapshot-on-sweep; explicit `save`
    /// calls are unaffected.
    pub snapshot_dir: Option<PathBuf>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }
}
