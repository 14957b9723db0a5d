//! marknote Core Library
//!
//! This crate provides the core functionality for marknote, a local-first
//! markdown editor that keeps titled entries in a flat key-value store.
//!
//! # Architecture
//!
//! - **Key-value storage**: every piece of state is a string under a string
//!   key, behind the [`KeyValueStore`] trait
//! - **Split layout**: an index of `{id, title, createdAt}` records plus one
//!   content key and one title key per entry, so typing rewrites one key
//! - **Contexts**: several repositories may share a store; each reconciles
//!   writes made by the others from [`StorageEvent`]s
//!
//! # Quick Start
//!
//! ```text
//! let store = DirStore::open(config.storage_dir())?;
//! let mut repo = EntryRepository::open(store, config.namespace())?;
//!
//! let entry = repo.add("Draft A")?.expect("title is not blank");
//! repo.update_content(entry.id, "# Hello")?;
//!
//! for entry in repo.sorted() {
//!     println!("{} {}", entry.created_at_jst(), entry.title);
//! }
//! ```
//!
//! # Modules
//!
//! - `repository`: the entry collection and its persistence (main entry point)
//! - `sync`: applying other contexts' writes, and watching a storage directory
//! - `storage`: key-value backends
//! - `keys`: storage key layout per entity kind
//! - `models`: entries and sort order
//! - `events`: storage and entry change notifications
//! - `prefs`: theme, language and last page
//! - `i18n`: English and Japanese UI strings
//! - `markdown`: HTML rendering
//! - `config`: application configuration

pub mod config;
pub mod events;
pub mod i18n;
pub mod keys;
pub mod markdown;
pub mod models;
pub mod prefs;
pub mod repository;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use events::{EntryEvent, EventBus, StorageEvent};
pub use i18n::{tr, Language, Text};
pub use keys::Namespace;
pub use models::{Entry, SortOrder};
pub use prefs::{Page, Preferences, Theme};
pub use repository::EntryRepository;
pub use storage::{DirStore, KeyValueStore, MemoryStore, NullStore, StorageError, StorageResult};
pub use sync::{StorageWatcher, SyncOutcome};
