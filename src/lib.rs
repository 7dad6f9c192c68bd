//! Snapcache - an in-process, thread-safe key/value cache
//!
//! Provides per-entry TTL expiration with lazy reads, an optional eviction
//! callback, a background sweeper that reclaims expired entries, and
//! best-effort snapshot persistence to disk with merge-on-load recovery.
//!
//! # Example
//!
//! ```
//! use snapcache::{Cache, Ttl};
//! use std::time::Duration;
//!
//! let cache: Cache<String> = Cache::new(Some(Duration::from_secs(300)), None);
//!
//! // Stored with the default TTL of five minutes.
//! cache.set("greeting", "hello".to_string(), Ttl::Default);
//! assert_eq!(cache.get("greeting"), Some("hello".to_string()));
//!
//! // Stored until explicitly deleted or flushed.
//! cache.set("pinned", "forever".to_string(), Ttl::Never);
//! assert_eq!(cache.item_count(), 2);
//! ```

pub mod cache;
pub mod config;
pub mod error;

mod persist;
mod tasks;

pub use cache::{Cache, Entry, EvictionHook, Store, Ttl};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use persist::{CURRENT_SNAPSHOT_FILE, HISTORY_FILE};
