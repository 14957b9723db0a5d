//! Command handlers

pub mod config;
pub mod entry;
pub mod prefs;
pub mod status;
pub mod watch;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use marknote_core::{Config, DirStore, EntryRepository, KeyValueStore};

/// Open the entry repository described by `config`
pub fn open_repository(config: &Config) -> Result<EntryRepository<DirStore>> {
    let store = DirStore::open(config.storage_dir()).with_context(|| {
        format!(
            "Failed to open storage at {}",
            config.storage_dir().display()
        )
    })?;
    EntryRepository::open(store, config.namespace()).context("Failed to load entries")
}

/// Parse an entry ID (supports full UUID or prefix)
pub fn parse_entry_id<S: KeyValueStore>(id: &str, repo: &EntryRepository<S>) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        if repo.get(uuid).is_some() {
            return Ok(uuid);
        }
        bail!("No entry found with ID: {}", id);
    }

    let matches = repo.find_by_prefix(id);
    match matches.len() {
        0 => bail!("No entry found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple entries match '{}':", id);
            for entry in &matches {
                eprintln!("  {} - {}", entry.id, entry.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
