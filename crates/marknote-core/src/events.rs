//! Change notifications
//!
//! Two kinds of events flow through marknote:
//!
//! - [`StorageEvent`]: a key changed in shared storage, reported to every
//!   context except the one that wrote it
//! - [`EntryEvent`]: the in-memory collection of a repository changed,
//!   published to in-process subscribers through an [`EventBus`]
//!
//! A repository publishes `EntryEvent`s for its own edits as well as for
//! edits it picks up from other contexts, so subscribers (list views,
//! editors) never need to know where a change came from.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Entry, SortOrder};

/// Capacity of the entry event channel
const EVENT_CAPACITY: usize = 128;

/// A change to shared storage made by another context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key, or `None` when the whole store was cleared
    pub key: Option<String>,
    /// Value before the change, when known
    pub old_value: Option<String>,
    /// Value after the change; `None` if the key was removed
    pub new_value: Option<String>,
}

impl StorageEvent {
    pub fn new(key: impl Into<String>, old_value: Option<String>, new_value: Option<String>) -> Self {
        Self {
            key: Some(key.into()),
            old_value,
            new_value,
        }
    }

    /// Event for "everything may have changed"
    pub fn cleared() -> Self {
        Self {
            key: None,
            old_value: None,
            new_value: None,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.key.is_none()
    }
}

/// A change to a repository's in-memory collection
#[derive(Debug, Clone, PartialEq)]
pub enum EntryEvent {
    /// The whole collection was rebuilt from storage
    Reloaded,
    /// A new entry was created
    Added(Entry),
    /// An entry's content changed
    ContentChanged { id: Uuid, content: String },
    /// An entry's title changed
    TitleChanged { id: Uuid, title: String },
    /// An entry was deleted
    Deleted(Uuid),
    /// The sort order changed
    SortOrderChanged(SortOrder),
    /// The selected entry changed
    SelectionChanged(Option<Uuid>),
}

impl EntryEvent {
    /// The entry this event is about, if it concerns a single entry
    pub fn entry_id(&self) -> Option<Uuid> {
        match self {
            EntryEvent::Added(entry) => Some(entry.id),
            EntryEvent::ContentChanged { id, .. }
            | EntryEvent::TitleChanged { id, .. }
            | EntryEvent::Deleted(id) => Some(*id),
            EntryEvent::SelectionChanged(id) => *id,
            EntryEvent::Reloaded | EntryEvent::SortOrderChanged(_) => None,
        }
    }
}

/// Publish/subscribe channel for [`EntryEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EntryEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EntryEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: EntryEvent) {
        // Nobody listening is not an error
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
