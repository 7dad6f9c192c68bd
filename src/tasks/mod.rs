//! Background Tasks Module
//!
//! Background work that runs alongside callers for the lifetime of a cache.
//!
//! # Tasks
//! - Sweeper: purges expired entries on a fixed interval, optionally
//!   snapshotting the entry set to disk first

mod sweeper;

pub(crate) use sweeper::{spawn_sweeper, SnapshotFn, SweeperHandle};
