//! Entry repository
//!
//! The `EntryRepository` keeps an ordered, in-memory collection of entries
//! and mirrors every change into a [`KeyValueStore`] using the split layout
//! described in [`crate::keys`]: an index holding `{id, title, createdAt}`
//! per entry, plus one content key and one title key per entry.
//!
//! ## Usage
//!
//! ```ignore
//! let mut repo = EntryRepository::open(MemoryStore::new(), Namespace::articles())?;
//!
//! let entry = repo.add("Draft A")?.expect("title is not blank");
//! repo.update_content(entry.id, "# Hello")?;
//!
//! for entry in repo.sorted() {
//!     println!("{} {}", entry.created_at_jst(), entry.title);
//! }
//! ```
//!
//! Every change is also published as an [`EntryEvent`]; call
//! [`EntryRepository::subscribe`] to follow them.

use std::collections::HashSet;

use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::{EntryEvent, EventBus};
use crate::keys::Namespace;
use crate::models::{Entry, SortOrder};
use crate::storage::{KeyValueStore, StorageResult};

/// Ordered collection of entries persisted in a key-value store
pub struct EntryRepository<S: KeyValueStore> {
    store: S,
    namespace: Namespace,
    /// Entries in insertion order (the index order)
    entries: Vec<Entry>,
    sort_order: SortOrder,
    selected: Option<Uuid>,
    events: EventBus,
}

impl<S: KeyValueStore> EntryRepository<S> {
    /// Open a repository over `store`, loading entries, sort order, and selection
    pub fn open(store: S, namespace: Namespace) -> StorageResult<Self> {
        let mut repo = Self {
            store,
            namespace,
            entries: Vec::new(),
            sort_order: SortOrder::default(),
            selected: None,
            events: EventBus::new(),
        };
        repo.entries = repo.read_entries()?;
        repo.sort_order = repo.read_sort_order()?;
        repo.selected = repo.read_selection()?;
        debug!(
            "Opened {} repository with {} entries",
            repo.namespace.entity(),
            repo.entries.len()
        );
        Ok(repo)
    }

    // ==================== Accessors ====================

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store
    ///
    /// Writes made here bypass the repository; call [`load`](Self::load)
    /// afterwards if they touch this namespace's keys.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Entries in index (insertion) order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries whose ID starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&Entry> {
        let prefix = prefix.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.id.to_string().starts_with(&prefix))
            .collect()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Entries ordered by creation time in the current sort order
    ///
    /// Entries created at the same instant keep their index order.
    pub fn sorted(&self) -> Vec<&Entry> {
        let mut sorted: Vec<&Entry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| self.sort_order.compare(a, b));
        sorted
    }

    pub fn selected_id(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Subscribe to changes of this repository
    pub fn subscribe(&self) -> broadcast::Receiver<EntryEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ==================== Operations ====================

    /// Reload the collection from storage
    ///
    /// Content and title come from their dedicated keys when present,
    /// falling back to the index's own copy. A corrupt index is discarded
    /// and the collection starts empty.
    pub fn load(&mut self) -> StorageResult<&[Entry]> {
        self.reload()?;
        Ok(&self.entries)
    }

    /// Create an entry with the given title
    ///
    /// Blank titles are ignored and return `None`. The new entry starts
    /// with empty content and becomes the selected entry.
    pub fn add(&mut self, title: &str) -> StorageResult<Option<Entry>> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring {} with blank title", self.namespace.entity());
            return Ok(None);
        }

        let mut entry = Entry::new(title);
        while self.get(entry.id).is_some() {
            entry.id = Uuid::new_v4();
        }

        // Auxiliary keys first so a context reacting to the index change
        // finds them in place
        self.store
            .set(&self.namespace.content_key(entry.id), &entry.content)?;
        self.store
            .set(&self.namespace.title_key(entry.id), &entry.title)?;
        self.entries.push(entry.clone());
        self.write_index()?;

        debug!("Added {} {}", self.namespace.entity(), entry.id);
        self.events.publish(EntryEvent::Added(entry.clone()));
        self.set_selection(Some(entry.id))?;

        Ok(Some(entry))
    }

    /// Replace an entry's content
    ///
    /// Only the entry's content key is written. Returns `false` if no
    /// entry has this ID.
    pub fn update_content(&mut self, id: Uuid, content: &str) -> StorageResult<bool> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };

        entry.content = content.to_string();
        self.store.set(&self.namespace.content_key(id), content)?;

        self.events.publish(EntryEvent::ContentChanged {
            id,
            content: content.to_string(),
        });
        Ok(true)
    }

    /// Replace an entry's title
    ///
    /// Writes the title key and the index's copy of the title. Blank
    /// titles are ignored. Returns `false` if nothing changed hands.
    pub fn update_title(&mut self, id: Uuid, title: &str) -> StorageResult<bool> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring blank title for {}", id);
            return Ok(false);
        }

        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };

        entry.title = title.to_string();
        self.store.set(&self.namespace.title_key(id), title)?;
        self.write_index()?;

        self.events.publish(EntryEvent::TitleChanged {
            id,
            title: title.to_string(),
        });
        Ok(true)
    }

    /// Delete an entry and its auxiliary keys
    ///
    /// When the last entry goes, the index and selection keys are removed
    /// as well, together with any stray content/title keys left in this
    /// namespace. Returns `false` if no entry has this ID.
    pub fn delete(&mut self, id: Uuid) -> StorageResult<bool> {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };

        self.entries.remove(pos);
        self.store.remove(&self.namespace.content_key(id))?;
        self.store.remove(&self.namespace.title_key(id))?;

        let stored_selection = self.store.get(self.namespace.selection_key())?;
        if stored_selection.as_deref() == Some(id.to_string().as_str()) || self.selected == Some(id)
        {
            self.set_selection(None)?;
        }

        if self.entries.is_empty() {
            self.store.remove(self.namespace.index_key())?;
            self.set_selection(None)?;
            self.remove_stray_keys()?;
        } else {
            self.write_index()?;
        }

        debug!("Deleted {} {}", self.namespace.entity(), id);
        self.events.publish(EntryEvent::Deleted(id));
        Ok(true)
    }

    /// Open an entry: refresh it from storage and remember it as selected
    pub fn select(&mut self, id: Uuid) -> StorageResult<Option<&Entry>> {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(None);
        };

        let content = self.store.get(&self.namespace.content_key(id))?;
        let title = self
            .store
            .get(&self.namespace.title_key(id))?
            .filter(|t| !t.is_empty());
        let entry = &mut self.entries[pos];
        if let Some(content) = content {
            entry.content = content;
        }
        if let Some(title) = title {
            entry.title = title;
        }

        self.set_selection(Some(id))?;
        Ok(self.entries.get(pos))
    }

    /// Change and persist the sort order
    pub fn set_sort_order(&mut self, order: SortOrder) -> StorageResult<()> {
        self.store.set(self.namespace.sort_key(), order.as_str())?;
        if self.sort_order != order {
            self.sort_order = order;
            self.events.publish(EntryEvent::SortOrderChanged(order));
        }
        Ok(())
    }

    /// Flip the sort order, returning the new one
    pub fn toggle_sort_order(&mut self) -> StorageResult<SortOrder> {
        let order = self.sort_order.toggled();
        self.set_sort_order(order)?;
        Ok(order)
    }

    // ==================== Reconciliation ====================

    /// Rebuild the collection from storage
    ///
    /// Returns whether the collection changed; `Reloaded` is published
    /// only in that case.
    pub(crate) fn reload(&mut self) -> StorageResult<bool> {
        let entries = self.read_entries()?;
        let changed = entries != self.entries;
        self.entries = entries;

        if let Some(id) = self.selected {
            if self.get(id).is_none() {
                self.selected = None;
                self.events.publish(EntryEvent::SelectionChanged(None));
            }
        }

        if changed {
            self.events.publish(EntryEvent::Reloaded);
        }
        Ok(changed)
    }

    /// Re-read sort order and selection from storage
    pub(crate) fn reload_settings(&mut self) -> StorageResult<bool> {
        let order = self.read_sort_order()?;
        let selection = self.read_selection()?;
        let sort_changed = self.adopt_sort_order(order);
        let selection_changed = self.adopt_selection(selection);
        Ok(sort_changed || selection_changed)
    }

    /// Set an entry's content in memory only
    pub(crate) fn patch_content(&mut self, id: Uuid, content: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.content != content => {
                entry.content = content.to_string();
                self.events.publish(EntryEvent::ContentChanged {
                    id,
                    content: content.to_string(),
                });
                true
            }
            _ => false,
        }
    }

    /// Set an entry's title in memory only
    pub(crate) fn patch_title(&mut self, id: Uuid, title: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.title != title => {
                entry.title = title.to_string();
                self.events.publish(EntryEvent::TitleChanged {
                    id,
                    title: title.to_string(),
                });
                true
            }
            _ => false,
        }
    }

    /// Take a sort order chosen elsewhere without writing it back
    pub(crate) fn adopt_sort_order(&mut self, order: SortOrder) -> bool {
        if self.sort_order == order {
            return false;
        }
        self.sort_order = order;
        self.events.publish(EntryEvent::SortOrderChanged(order));
        true
    }

    /// Take a selection made elsewhere without writing it back
    pub(crate) fn adopt_selection(&mut self, id: Option<Uuid>) -> bool {
        let id = id.filter(|id| self.get(*id).is_some());
        if self.selected == id {
            return false;
        }
        self.selected = id;
        self.events.publish(EntryEvent::SelectionChanged(id));
        true
    }

    // ==================== Storage helpers ====================

    fn read_entries(&mut self) -> StorageResult<Vec<Entry>> {
        let Some(raw) = self.store.get(self.namespace.index_key())? else {
            return Ok(Vec::new());
        };

        let records: Vec<Entry> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Discarding corrupt index '{}': {}",
                    self.namespace.index_key(),
                    e
                );
                self.store.remove(self.namespace.index_key())?;
                return Ok(Vec::new());
            }
        };

        let mut seen = HashSet::with_capacity(records.len());
        let mut entries = Vec::with_capacity(records.len());
        for mut entry in records {
            if !seen.insert(entry.id) {
                warn!("Skipping duplicate index record {}", entry.id);
                continue;
            }
            if let Some(content) = self.store.get(&self.namespace.content_key(entry.id))? {
                entry.content = content;
            }
            // An empty title key never hides the index title
            if let Some(title) = self
                .store
                .get(&self.namespace.title_key(entry.id))?
                .filter(|t| !t.is_empty())
            {
                entry.title = title;
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    fn read_sort_order(&self) -> StorageResult<SortOrder> {
        let order = self
            .store
            .get(self.namespace.sort_key())?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        Ok(order)
    }

    fn read_selection(&self) -> StorageResult<Option<Uuid>> {
        let id = self
            .store
            .get(self.namespace.selection_key())?
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .filter(|id| self.get(*id).is_some());
        Ok(id)
    }

    fn write_index(&mut self) -> StorageResult<()> {
        let records: Vec<Entry> = self.entries.iter().map(Entry::index_record).collect();
        let json = serde_json::to_string(&records)?;
        self.store.set(self.namespace.index_key(), &json)
    }

    fn set_selection(&mut self, id: Option<Uuid>) -> StorageResult<()> {
        match id {
            Some(id) => self
                .store
                .set(self.namespace.selection_key(), &id.to_string())?,
            None => self.store.remove(self.namespace.selection_key())?,
        }
        if self.selected != id {
            self.selected = id;
            self.events.publish(EntryEvent::SelectionChanged(id));
        }
        Ok(())
    }

    fn remove_stray_keys(&mut self) -> StorageResult<()> {
        let stray: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|key| self.namespace.is_auxiliary(key))
            .collect();
        for key in stray {
            debug!("Removing stray key {}", key);
            self.store.remove(&key)?;
        }
        Ok(())
    }
}
