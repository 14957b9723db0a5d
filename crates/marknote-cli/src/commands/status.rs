//! Status command handler

use anyhow::Result;

use marknote_core::markdown::word_count;
use marknote_core::{Config, DirStore, EntryRepository, Preferences};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(repo: &EntryRepository<DirStore>, config: &Config, output: &Output) -> Result<()> {
    let store = repo.store();
    let size = store.total_size();
    let words: usize = repo.entries().iter().map(|e| word_count(&e.content)).sum();
    let prefs = Preferences::load(store)?;
    let ns = repo.namespace();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "entity": ns.entity(),
                    "index_key": ns.index_key(),
                    "storage": {
                        "location": store.dir(),
                        "total_size": size,
                    },
                    "counts": {
                        "entries": repo.len(),
                        "words": words,
                    },
                    "sort_order": repo.sort_order(),
                    "selected": repo.selected_id(),
                    "preferences": prefs,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", repo.len());
        }
        OutputFormat::Human => {
            println!("marknote Status");
            println!("===============");
            println!();
            println!("Storage:");
            println!("  Location: {}", store.dir().display());
            println!("  Size:     {}", human_size(size));
            println!("  Config:   {}", Config::config_file_path().display());
            println!("  Data dir: {}", config.data_dir.display());
            println!();
            println!("Contents ({}):", ns.entity());
            println!("  Entries: {}", repo.len());
            println!("  Words:   {}", words);
            println!("  Sort:    {}", repo.sort_order());
            if let Some(entry) = repo.selected() {
                println!("  Last opened: {} - {}", entry.short_id(), entry.title);
            }
            println!();
            println!("Preferences:");
            println!("  Theme:    {}", prefs.theme);
            println!("  Language: {}", prefs.language);
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
