//! Snapshot Persistence Module
//!
//! Encodes the raw entry set to disk and merges snapshots back into a live
//! store. Every save produces two artifacts in the target directory: an
//! append-only history log, one timestamped record set per save, and an
//! overwritten current-snapshot file holding only the latest record set.
//! The record format is a JSON object mapping each key to its value and
//! 64-bit expiration timestamp (`0` = never expires).

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{Entry, Store};
use crate::error::{CacheError, Result};

/// File holding only the most recent snapshot; overwritten on every save.
pub const CURRENT_SNAPSHOT_FILE: &str = "current.json";

/// Append-only log of every snapshot ever saved, one timestamp-prefixed
/// record set per line.
pub const HISTORY_FILE: &str = "history.log";

fn snapshot_paths(dir: Option<&Path>) -> Result<(PathBuf, PathBuf)> {
    match dir {
        Some(dir) => {
            // create_dir_all tolerates a concurrent creator winning the race.
            fs::create_dir_all(dir)?;
            Ok((dir.join(CURRENT_SNAPSHOT_FILE), dir.join(HISTORY_FILE)))
        }
        None => Ok((
            PathBuf::from(CURRENT_SNAPSHOT_FILE),
            PathBuf::from(HISTORY_FILE),
        )),
    }
}

// == Save ==
/// Serializes the raw entry map into the history log and the current
/// snapshot file, defaulting to the working directory.
///
/// The snapshot covers the same raw map `item_count` sees: expired entries
/// the sweeper has not reclaimed yet are included, and the shared entries
/// lock is held across the file writes. Callers on a latency-sensitive path
/// should not invoke this synchronously.
pub(crate) fn save<V: Serialize>(store: &Store<V>, dir: Option<&Path>) -> Result<()> {
    let (current_path, history_path) = snapshot_paths(dir)?;

    let mut history = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&history_path)?;

    store.with_entries(|entries| -> Result<()> {
        let encoded = serde_json::to_vec(entries).map_err(CacheError::Encode)?;

        let mut record = Vec::with_capacity(encoded.len() + 40);
        record.extend_from_slice(Utc::now().to_rfc3339().as_bytes());
        record.push(b' ');
        record.extend_from_slice(&encoded);
        record.push(b'\n');
        history.write_all(&record)?;

        fs::write(&current_path, &encoded)?;
        Ok(())
    })?;

    debug!(path = %current_path.display(), "snapshot written");
    Ok(())
}

// == Load ==
/// Decodes one snapshot record set and merges it into the store.
///
/// Merging is asymmetric: a decoded key is installed only where the store
/// has no entry or the stored entry has expired, so state set during the
/// startup window is never clobbered by the snapshot.
pub(crate) fn load<V: DeserializeOwned>(store: &Store<V>, path: &Path) -> Result<()> {
    let raw = fs::read(path)?;
    let incoming: HashMap<String, Entry<V>> =
        serde_json::from_slice(&raw).map_err(CacheError::Decode)?;

    let installed = store.merge(incoming);
    debug!(path = %path.display(), installed, "snapshot merged");
    Ok(())
}
