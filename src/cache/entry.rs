//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Sentinel expiration meaning "never expires".
pub(crate) const NO_EXPIRATION: i64 = 0;

// == Ttl ==
/// Per-entry time-to-live selector passed to `set`/`add`/`replace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Substitute the cache's default TTL. Falls back to `Never` when the
    /// cache was built without one.
    Default,
    /// The entry never expires; it stays until re-set, deleted or flushed.
    Never,
    /// The entry expires this long from now.
    After(Duration),
}

// == Entry ==
/// A stored value and its absolute expiration instant.
///
/// The payload is opaque to the cache: it is copied in and out of the map
/// and never interpreted. The serde derives define the snapshot record
/// format, so field names are part of the on-disk contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp in nanoseconds since the Unix epoch;
    /// `0` = never expires
    pub expires_at: i64,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    /// Checks whether the entry has expired.
    ///
    /// An entry with no expiration is never expired; otherwise it is expired
    /// once the wall clock strictly exceeds `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_nanos())
    }

    /// Expiry check against a caller-supplied instant, so a bulk scan can
    /// apply one consistent cutoff to every entry.
    pub(crate) fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at > NO_EXPIRATION && now > self.expires_at
    }

    /// Returns the absolute expiration instant, or `None` for an entry that
    /// never expires.
    pub fn expiration_time(&self) -> Option<SystemTime> {
        if self.expires_at > NO_EXPIRATION {
            Some(UNIX_EPOCH + Duration::from_nanos(self.expires_at as u64))
        } else {
            None
        }
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in nanoseconds.
pub(crate) fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_nanos() as i64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_no_expiration_never_expires() {
        let entry = Entry::new("value", NO_EXPIRATION);

        assert!(!entry.is_expired());
        assert!(entry.expiration_time().is_none());
    }

    #[test]
    fn test_entry_future_expiration_is_live() {
        let entry = Entry::new("value", now_nanos() + 1_000_000_000);

        assert!(!entry.is_expired());
        assert!(entry.expiration_time().is_some());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = Entry::new("value", now_nanos() + 50_000_000);

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(80));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_is_strict() {
        // Expired only once the clock strictly exceeds expires_at.
        let entry = Entry::new("value", 1_000);
        assert!(!entry.is_expired_at(1_000));
        assert!(entry.is_expired_at(1_001));
    }

    #[test]
    fn test_entry_roundtrips_through_json() {
        let entry = Entry::new(42u32, 1_700_000_000_000_000_000);

        let encoded = serde_json::to_string(&entry).unwrap();
        let decoded: Entry<u32> = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_expiration_time_matches_timestamp() {
        let expires_at = now_nanos() + 5_000_000_000;
        let entry = Entry::new((), expires_at);

        let instant = entry.expiration_time().unwrap();
        let nanos = instant.duration_since(UNIX_EPOCH).unwrap().as_nanos() as i64;
        assert_eq!(nanos, expires_at);
    }
}
