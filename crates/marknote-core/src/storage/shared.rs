//! Shared in-process store with cross-context notifications
//!
//! A [`SharedStore`] owns one key-value map and hands out any number of
//! [`ContextStore`]s, each acting like a separate browser tab over the
//! same storage. When a context changes a value, every *other* context
//! receives a [`StorageEvent`] through its [`StorageEvents`] stream. The
//! writing context is never notified of its own writes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::warn;

use super::{KeyValueStore, StorageResult};
use crate::events::StorageEvent;

/// Capacity of the notification channel before slow contexts start lagging
const NOTICE_CAPACITY: usize = 256;

/// Identifies one context attached to a [`SharedStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Notice {
    /// `None` when the change did not come from a context (e.g. `clear`)
    origin: Option<ContextId>,
    event: StorageEvent,
}

#[derive(Debug)]
struct Hub {
    map: Mutex<BTreeMap<String, String>>,
    notices: broadcast::Sender<Notice>,
    next_id: AtomicU64,
}

impl Hub {
    fn map(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.map.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, origin: Option<ContextId>, event: StorageEvent) {
        // No receivers is fine: nobody is listening
        let _ = self.notices.send(Notice { origin, event });
    }
}

/// Storage shared by several in-process contexts
#[derive(Debug, Clone)]
pub struct SharedStore {
    hub: Arc<Hub>,
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStore {
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            hub: Arc::new(Hub {
                map: Mutex::new(BTreeMap::new()),
                notices,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Attach a new context to this store
    pub fn context(&self) -> ContextStore {
        let id = ContextId(self.hub.next_id.fetch_add(1, Ordering::Relaxed));
        ContextStore {
            id,
            hub: Arc::clone(&self.hub),
        }
    }

    /// Remove every key; all contexts are notified with a `None` key
    pub fn clear(&self) {
        self.hub.map().clear();
        self.hub.notify(None, StorageEvent::cleared());
    }
}

/// One context's view of a [`SharedStore`]
#[derive(Debug, Clone)]
pub struct ContextStore {
    id: ContextId,
    hub: Arc<Hub>,
}

impl ContextStore {
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Subscribe to changes made by other contexts
    ///
    /// Only changes made after subscribing are delivered.
    pub fn subscribe(&self) -> StorageEvents {
        StorageEvents {
            id: self.id,
            rx: self.hub.notices.subscribe(),
        }
    }
}

impl KeyValueStore for ContextStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.hub.map().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let old_value = self.hub.map().insert(key.to_string(), value.to_string());
        if old_value.as_deref() != Some(value) {
            self.hub.notify(
                Some(self.id),
                StorageEvent::new(key, old_value, Some(value.to_string())),
            );
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let old_value = self.hub.map().remove(key);
        if old_value.is_some() {
            self.hub
                .notify(Some(self.id), StorageEvent::new(key, old_value, None));
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.hub.map().keys().cloned().collect())
    }
}

/// Stream of changes made by other contexts
#[derive(Debug)]
pub struct StorageEvents {
    id: ContextId,
    rx: broadcast::Receiver<Notice>,
}

impl StorageEvents {
    /// Wait for the next change from another context
    ///
    /// Returns `None` once the store and all its contexts are dropped. If
    /// this subscriber fell behind and notifications were lost, a
    /// [`StorageEvent::cleared`] is returned so the receiver reloads
    /// everything.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(notice) => {
                    if let Some(event) = self.accept(notice) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("{} missed {} storage notifications", self.id, missed);
                    return Some(StorageEvent::cleared());
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next pending change without waiting
    pub fn try_recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(notice) => {
                    if let Some(event) = self.accept(notice) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!("{} missed {} storage notifications", self.id, missed);
                    return Some(StorageEvent::cleared());
                }
                Err(_) => return None,
            }
        }
    }

    /// Drain every pending change
    pub fn drain(&mut self) -> Vec<StorageEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    fn accept(&self, notice: Notice) -> Option<StorageEvent> {
        (notice.origin != Some(self.id)).then_some(notice.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_share_values() {
        let shared = SharedStore::new();
        let mut a = shared.context();
        let b = shared.context();

        a.set("theme", "dark").unwrap();
        assert_eq!(b.get("theme").unwrap().as_deref(), Some("dark"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_writer_is_not_notified() {
        let shared = SharedStore::new();
        let mut a = shared.context();
        let b = shared.context();
        let mut a_events = a.subscribe();
        let mut b_events = b.subscribe();

        a.set("articles", "[]").unwrap();

        assert!(a_events.try_recv().is_none());
        let event = b_events.try_recv().unwrap();
        assert_eq!(event.key.as_deref(), Some("articles"));
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("[]"));
    }

    #[test]
    fn test_unchanged_writes_are_silent() {
        let shared = SharedStore::new();
        let mut a = shared.context();
        let mut b_events = shared.context().subscribe();

        a.set("lastPage", "home").unwrap();
        a.set("lastPage", "home").unwrap();
        a.remove("missing").unwrap();

        assert_eq!(b_events.drain().len(), 1);
    }

    #[test]
    fn test_remove_notifies_with_old_value() {
        let shared = SharedStore::new();
        let mut a = shared.context();
        a.set("k", "v").unwrap();
        let mut b_events = shared.context().subscribe();

        a.remove("k").unwrap();

        let event = b_events.try_recv().unwrap();
        assert_eq!(event.old_value.as_deref(), Some("v"));
        assert!(event.new_value.is_none());
    }

    #[test]
    fn test_clear_notifies_everyone() {
        let shared = SharedStore::new();
        let mut a = shared.context();
        a.set("k", "v").unwrap();
        let mut a_events = a.subscribe();

        shared.clear();

        assert!(a.get("k").unwrap().is_none());
        assert!(a_events.try_recv().unwrap().is_clear());
    }

    #[tokio::test]
    async fn test_async_recv() {
        let shared = SharedStore::new();
        let mut a = shared.context();
        let mut b_events = shared.context().subscribe();

        a.set("articles_sort_order", "asc").unwrap();

        let event = b_events.recv().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("articles_sort_order"));
    }
}
