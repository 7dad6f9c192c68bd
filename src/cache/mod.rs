//! Cache Module
//!
//! The cache engine: entries, the locked store and the public handle.

mod entry;
mod handle;
mod store;


// Re-export public types
pub use entry::{Entry, Ttl};
pub use handle::Cache;
pub use store::{EvictionHook, Store};
