//! Watch command handler
//!
//! Follows writes made by other marknote processes to the storage
//! directory and reports how each one changed the collection.

use anyhow::{Context, Result};
use tracing::warn;

use marknote_core::{DirStore, EntryRepository, Preferences, StorageWatcher, SyncOutcome};

use crate::output::{Output, OutputFormat};

/// Stream external changes until interrupted
pub async fn run(repo: &mut EntryRepository<DirStore>, output: &Output) -> Result<()> {
    let (_watcher, mut rx) =
        StorageWatcher::spawn(repo.store()).context("Failed to watch storage directory")?;
    let mut prefs = Preferences::load(repo.store()).context("Failed to read preferences")?;

    output.message(&format!(
        "Watching {} ({} entries). Press Ctrl-C to stop.",
        repo.store().dir().display(),
        repo.len()
    ));

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };

                if prefs.apply_storage_event(&event) {
                    report(output, "preferences", &format!("theme={} language={}", prefs.theme, prefs.language));
                }

                let outcome = match repo.apply_storage_event(&event) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Failed to apply change to {:?}: {}", event.key, e);
                        continue;
                    }
                };
                describe(repo, outcome, output);
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    Ok(())
}

fn describe(repo: &EntryRepository<DirStore>, outcome: SyncOutcome, output: &Output) {
    let title_of = |id: uuid::Uuid| {
        repo.get(id)
            .map(|e| e.title.clone())
            .unwrap_or_else(|| id.to_string())
    };

    match outcome {
        SyncOutcome::Ignored => {}
        SyncOutcome::Reloaded => report(output, "reloaded", &format!("{} entries", repo.len())),
        SyncOutcome::ContentPatched(id) => report(output, "content", &title_of(id)),
        SyncOutcome::TitlePatched(id) => report(output, "title", &title_of(id)),
        SyncOutcome::SortOrderChanged(order) => report(output, "sort", order.as_str()),
    }
}

fn report(output: &Output, kind: &str, detail: &str) {
    match output.format {
        OutputFormat::Human => println!("{:<11} {}", kind, detail),
        OutputFormat::Json => println!("{}", serde_json::json!({ "change": kind, "detail": detail })),
        OutputFormat::Quiet => println!("{}", kind),
    }
}
