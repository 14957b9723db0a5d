//! Storage layer
//!
//! Every piece of persisted state lives in a flat string-to-string
//! key-value store. The repository never touches the filesystem directly;
//! it is handed a [`KeyValueStore`] and works against that.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: in-memory map, used by tests
//! - [`NullStore`]: no backing storage at all; reads are empty, writes vanish
//! - [`DirStore`]: one file per key inside a directory (the CLI default)
//! - [`SharedStore`]: in-process hub handing out [`ContextStore`]s that
//!   notify each other of writes

pub mod error;
pub mod file;
pub mod memory;
pub mod shared;

pub use error::{StorageError, StorageResult};
pub use file::DirStore;
pub use memory::MemoryStore;
pub use shared::{ContextId, ContextStore, SharedStore, StorageEvents};

/// A synchronous string key-value store
///
/// Semantics follow a browser's local storage: last write wins per key,
/// removing a missing key is not an error, and `keys` has no defined order.
pub trait KeyValueStore {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key` if present
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// List every key currently stored
    fn keys(&self) -> StorageResult<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }
}

/// Store used when no storage is available
///
/// Every read comes back empty and every write is accepted and dropped, so
/// code running without persistence degrades to an empty session instead
/// of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
        Ok(())
    }

    fn remove(&mut self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_store_drops_writes() {
        let mut store = NullStore;
        store.set("articles", "[]").unwrap();
        assert!(store.get("articles").unwrap().is_none());
        assert!(store.keys().unwrap().is_empty());
        store.remove("articles").unwrap();
    }

    #[test]
    fn test_boxed_store_delegates() {
        let mut store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        store.remove("theme").unwrap();
        assert!(store.get("theme").unwrap().is_none());
    }
}
