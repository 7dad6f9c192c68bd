//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// `KeyExists` and `KeyNotFound` are expected control-flow outcomes of
/// `add`/`replace` under normal key contention, not exceptional conditions.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `add` was called on a key that already holds a live entry.
    /// Carries the conflicting value (Debug-formatted) for diagnostics.
    #[error("key {key:?} already exists with value {current}")]
    KeyExists { key: String, current: String },

    /// `replace` was called on a key with no live entry.
    #[error("key {key:?} not found")]
    KeyNotFound { key: String },

    /// Snapshot read/write failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot content is not a valid record set.
    #[error("snapshot decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The entry map could not be serialized.
    #[error("snapshot encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
