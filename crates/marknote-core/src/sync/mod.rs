//! Cross-context synchronization
//!
//! Several contexts (tabs, processes) may hold a repository over the same
//! storage. None of them is in charge; each one listens for
//! [`StorageEvent`]s describing writes made elsewhere and reconciles its
//! in-memory collection:
//!
//! 1. Index key changed: reload the collection with content/title overlays
//! 2. Content key changed: patch that entry's content
//! 3. Title key changed: patch that entry's title
//! 4. Sort order key changed: adopt the new order
//! 5. Whole store cleared: reload everything
//!
//! Writes made by a context itself never come back as `StorageEvent`s on a
//! [`SharedStore`](crate::storage::SharedStore). A [`StorageWatcher`] on a
//! directory does report them, but they match the in-memory state and are
//! ignored. In-process listeners follow the repository's own
//! [`EntryEvent`](crate::events::EntryEvent)s instead.
//!
//! Concurrent edits of the same key are last-write-wins.

mod watcher;

pub use watcher::StorageWatcher;

use tracing::debug;
use uuid::Uuid;

use crate::events::StorageEvent;
use crate::keys::KeyKind;
use crate::models::SortOrder;
use crate::repository::EntryRepository;
use crate::storage::{KeyValueStore, StorageResult};

/// What applying a [`StorageEvent`] did to a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The collection was rebuilt and differs from before
    Reloaded,
    /// One entry's content was replaced
    ContentPatched(Uuid),
    /// One entry's title was replaced
    TitlePatched(Uuid),
    /// The sort order was adopted
    SortOrderChanged(SortOrder),
    /// Nothing in memory changed
    Ignored,
}

impl SyncOutcome {
    pub fn is_change(self) -> bool {
        self != SyncOutcome::Ignored
    }
}

impl<S: KeyValueStore> EntryRepository<S> {
    /// Reconcile with a write made by another context
    pub fn apply_storage_event(&mut self, event: &StorageEvent) -> StorageResult<SyncOutcome> {
        let Some(key) = event.key.as_deref() else {
            debug!("Storage cleared elsewhere, reloading");
            let entries_changed = self.reload()?;
            let settings_changed = self.reload_settings()?;
            return Ok(if entries_changed || settings_changed {
                SyncOutcome::Reloaded
            } else {
                SyncOutcome::Ignored
            });
        };

        let outcome = match self.namespace().classify(key) {
            KeyKind::Index => {
                if self.reload()? {
                    SyncOutcome::Reloaded
                } else {
                    SyncOutcome::Ignored
                }
            }
            KeyKind::Content(id) => {
                let content = event.new_value.as_deref().unwrap_or_default();
                if self.patch_content(id, content) {
                    SyncOutcome::ContentPatched(id)
                } else {
                    SyncOutcome::Ignored
                }
            }
            KeyKind::Title(id) => {
                let title = event.new_value.as_deref().unwrap_or_default();
                if self.patch_title(id, title) {
                    SyncOutcome::TitlePatched(id)
                } else {
                    SyncOutcome::Ignored
                }
            }
            KeyKind::SortOrder => {
                let order = event
                    .new_value
                    .as_deref()
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or_default();
                if self.adopt_sort_order(order) {
                    SyncOutcome::SortOrderChanged(order)
                } else {
                    SyncOutcome::Ignored
                }
            }
            // Each context keeps its own selection
            KeyKind::Selection | KeyKind::Other => SyncOutcome::Ignored,
        };

        if outcome.is_change() {
            debug!("Applied external change to {}: {:?}", key, outcome);
        }
        Ok(outcome)
    }

    /// Apply a batch of events, returning how many changed something
    pub fn apply_storage_events<I>(&mut self, events: I) -> StorageResult<usize>
    where
        I: IntoIterator<Item = StorageEvent>,
    {
        let mut changed = 0;
        for event in events {
            if self.apply_storage_event(&event)?.is_change() {
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EntryEvent;
    use crate::keys::Namespace;
    use crate::storage::{ContextStore, SharedStore};

    fn two_tabs() -> (
        EntryRepository<ContextStore>,
        EntryRepository<ContextStore>,
        crate::storage::StorageEvents,
    ) {
        let shared = SharedStore::new();
        let a = shared.context();
        let b = shared.context();
        let b_events = b.subscribe();
        (
            EntryRepository::open(a, Namespace::articles()).unwrap(),
            EntryRepository::open(b, Namespace::articles()).unwrap(),
            b_events,
        )
    }

    #[test]
    fn test_add_in_one_tab_appears_in_other() {
        let (mut a, mut b, mut b_events) = two_tabs();

        let entry = a.add("Draft A").unwrap().unwrap();
        let changed = b.apply_storage_events(b_events.drain()).unwrap();

        assert!(changed >= 1);
        assert_eq!(b.len(), 1);
        assert_eq!(b.entries()[0].id, entry.id);
        assert_eq!(b.entries()[0].title, "Draft A");
    }

    #[test]
    fn test_content_patch() {
        let (mut a, mut b, mut b_events) = two_tabs();
        let entry = a.add("Draft").unwrap().unwrap();
        b.apply_storage_events(b_events.drain()).unwrap();

        a.update_content(entry.id, "# Hello").unwrap();
        let events = b_events.drain();
        assert_eq!(events.len(), 1);

        let outcome = b.apply_storage_event(&events[0]).unwrap();
        assert_eq!(outcome, SyncOutcome::ContentPatched(entry.id));
        assert_eq!(b.get(entry.id).unwrap().content, "# Hello");
    }

    #[test]
    fn test_title_patch_publishes_event() {
        let (mut a, mut b, mut b_events) = two_tabs();
        let entry = a.add("Old").unwrap().unwrap();
        b.apply_storage_events(b_events.drain()).unwrap();
        let mut b_rx = b.subscribe();

        a.update_title(entry.id, "New").unwrap();
        b.apply_storage_events(b_events.drain()).unwrap();

        assert_eq!(b.get(entry.id).unwrap().title, "New");
        let mut saw_title = false;
        while let Ok(event) = b_rx.try_recv() {
            if event
                == (EntryEvent::TitleChanged {
                    id: entry.id,
                    title: "New".to_string(),
                })
            {
                saw_title = true;
            }
        }
        assert!(saw_title);
    }

    #[test]
    fn test_delete_propagates() {
        let (mut a, mut b, mut b_events) = two_tabs();
        let keep = a.add("Keep").unwrap().unwrap();
        let gone = a.add("Gone").unwrap().unwrap();
        b.apply_storage_events(b_events.drain()).unwrap();
        assert_eq!(b.len(), 2);

        a.delete(gone.id).unwrap();
        b.apply_storage_events(b_events.drain()).unwrap();

        assert_eq!(b.len(), 1);
        assert_eq!(b.entries()[0].id, keep.id);
    }

    #[test]
    fn test_sort_order_propagates() {
        let (mut a, mut b, mut b_events) = two_tabs();

        a.toggle_sort_order().unwrap();
        let outcomes: Vec<SyncOutcome> = b_events
            .drain()
            .iter()
            .map(|e| b.apply_storage_event(e).unwrap())
            .collect();

        assert_eq!(outcomes, vec![SyncOutcome::SortOrderChanged(SortOrder::Asc)]);
        assert_eq!(b.sort_order(), SortOrder::Asc);
    }

    #[test]
    fn test_selection_is_per_context() {
        let (mut a, mut b, mut b_events) = two_tabs();
        let first = a.add("First").unwrap().unwrap();
        b.apply_storage_events(b_events.drain()).unwrap();
        b.select(first.id).unwrap();

        a.add("Second").unwrap();
        b.apply_storage_events(b_events.drain()).unwrap();

        assert_eq!(b.selected_id(), Some(first.id));
    }

    #[test]
    fn test_events_for_other_namespaces_ignored() {
        let (_, mut b, _) = two_tabs();
        let event = StorageEvent::new("todos", None, Some("[]".to_string()));
        assert_eq!(b.apply_storage_event(&event).unwrap(), SyncOutcome::Ignored);

        let event = StorageEvent::new(
            format!("article_content_{}", Uuid::new_v4()),
            None,
            Some("orphan".to_string()),
        );
        assert_eq!(b.apply_storage_event(&event).unwrap(), SyncOutcome::Ignored);
    }

    #[test]
    fn test_clear_reloads_to_empty() {
        let shared = SharedStore::new();
        let mut a = EntryRepository::open(shared.context(), Namespace::articles()).unwrap();
        a.add("Doomed").unwrap();
        let mut a_events = a.store().subscribe();

        shared.clear();
        let event = a_events.try_recv().unwrap();
        assert_eq!(a.apply_storage_event(&event).unwrap(), SyncOutcome::Reloaded);
        assert!(a.is_empty());
        assert!(a.selected().is_none());
    }

    #[test]
    fn test_writer_never_sees_own_changes() {
        let shared = SharedStore::new();
        let ctx = shared.context();
        let mut own_events = ctx.subscribe();
        let mut repo = EntryRepository::open(ctx, Namespace::articles()).unwrap();

        let entry = repo.add("Mine").unwrap().unwrap();
        repo.update_content(entry.id, "text").unwrap();

        assert!(own_events.drain().is_empty());
    }

    #[test]
    fn test_replayed_own_write_is_ignored() {
        let (mut a, _, _) = two_tabs();
        let entry = a.add("Draft").unwrap().unwrap();
        a.update_content(entry.id, "same").unwrap();

        let echo = StorageEvent::new(
            a.namespace().content_key(entry.id),
            None,
            Some("same".to_string()),
        );
        assert_eq!(a.apply_storage_event(&echo).unwrap(), SyncOutcome::Ignored);

        let echo = StorageEvent::new("articles", None, None);
        assert_eq!(a.apply_storage_event(&echo).unwrap(), SyncOutcome::Ignored);
    }
}
