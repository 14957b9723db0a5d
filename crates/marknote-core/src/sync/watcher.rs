//! Filesystem watcher turning changes in a [`DirStore`] into [`StorageEvent`]s
//!
//! Another `marknote` process writing to the same storage directory shows
//! up here as file creations, modifications and removals. Each one is
//! mapped back to its key and forwarded with the value read from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::events::StorageEvent;
use crate::storage::DirStore;

/// Watches a storage directory for writes made by other processes
///
/// Dropping the watcher stops it; the receiver then yields `None`.
pub struct StorageWatcher {
    _watcher: RecommendedWatcher,
}

impl StorageWatcher {
    /// Start watching `store`'s directory
    pub fn spawn(store: &DirStore) -> Result<(Self, UnboundedReceiver<StorageEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let keys = store.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => forward(&keys, event, &tx),
                Err(e) => warn!("Storage watch error: {}", e),
            }
        })
        .context("Failed to create storage watcher")?;

        watcher
            .watch(store.dir(), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", store.dir().display()))?;

        debug!("Watching {}", store.dir().display());
        Ok((Self { _watcher: watcher }, rx))
    }
}

fn forward(store: &DirStore, event: Event, tx: &UnboundedSender<StorageEvent>) {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }

    for path in &event.paths {
        let Some(key) = key_for(store, path) else {
            continue;
        };
        // Read the current value rather than trusting the event kind:
        // a rename-into-place arrives as a mix of create/modify/remove.
        let new_value = fs::read_to_string(path).ok();
        if tx.send(StorageEvent::new(key, None, new_value)).is_err() {
            return;
        }
    }
}

/// Map a reported path to a key, tolerating symlinked or canonicalized roots
fn key_for(store: &DirStore, path: &Path) -> Option<String> {
    let name = path.file_name()?;
    store.key_for_path(&store.dir().join(name))
}
