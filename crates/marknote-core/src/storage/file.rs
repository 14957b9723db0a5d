//! Directory-backed key-value store
//!
//! Each key is a file in one directory, holding the value as UTF-8 text.
//! Writes are atomic (write to temp file, then rename) so a reader in
//! another process never sees a half-written value.
//!
//! Storage location: `~/.local/share/marknote/storage/` (configurable via
//! `Config`)
//!
//! File names are the keys with every byte outside `[A-Za-z0-9_.-]`
//! percent-encoded. A leading `.` is encoded too, which leaves dot-files
//! free for temp files.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KeyValueStore, StorageError, StorageResult};

/// Key-value store with one file per key
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self { dir })
    }

    /// The directory holding the key files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        Ok(self.dir.join(encode_key(key)?))
    }

    /// Map a file path back to its key
    ///
    /// Returns `None` for files outside the store directory, temp files,
    /// and names that are not valid encodings.
    pub fn key_for_path(&self, path: &Path) -> Option<String> {
        if path.parent()? != self.dir.as_path() {
            return None;
        }
        decode_key(path.file_name()?.to_str()?)
    }

    /// Total size in bytes of all stored values
    pub fn total_size(&self) -> u64 {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .filter(|m| m.is_file())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read(e, path)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        debug!("Writing key {} ({} bytes)", key, value.len());
        atomic_write(&path, value.as_bytes())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed key {}", key);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let entries =
            fs::read_dir(&self.dir).map_err(|e| StorageError::from_read(e, self.dir.clone()))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::from_read(e, self.dir.clone()))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            if let Some(key) = entry.file_name().to_str().and_then(decode_key) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a hidden temp file in the same directory, unique per write
///    so concurrent writers never share one
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("value");

    // Leading dot keeps temp files out of `keys()` and the watcher
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    temp.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp.path().to_path_buf()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StorageError::from_io(e, temp.path().to_path_buf()))?;

    temp.persist(path).map_err(|e| StorageError::AtomicWriteFailed {
        from: e.file.path().to_path_buf(),
        to: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.')
}

/// Encode a key as a file name
fn encode_key(key: &str) -> StorageResult<String> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        });
    }

    let mut encoded = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        if is_plain(byte) && !(i == 0 && byte == b'.') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    Ok(encoded)
}

/// Decode a file name back to its key
fn decode_key(name: &str) -> Option<String> {
    if name.is_empty() || name.starts_with('.') {
        return None;
    }

    let bytes = name.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = name.get(i + 1..i + 3)?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if is_plain(b) => {
                decoded.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    String::from_utf8(decoded).ok()
}
