//! Entry command handlers

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use marknote_core::markdown::render_document;
use marknote_core::{EntryRepository, KeyValueStore, SortOrder};

use crate::commands::parse_entry_id;
use crate::editor::{confirm, edit_entry, read_piped_stdin};
use crate::output::Output;

/// Create a new entry
pub fn add<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    title: String,
    output: &Output,
) -> Result<()> {
    let Some(entry) = repo.add(&title).context("Failed to create entry")? else {
        bail!("Title must not be blank");
    };

    output.success(&format!("Created entry: {}", entry.id));
    output.print_entry(&entry);
    Ok(())
}

/// List entries in the stored sort order, or the one given
pub fn list<S: KeyValueStore>(
    repo: &EntryRepository<S>,
    order: Option<SortOrder>,
    output: &Output,
) -> Result<()> {
    let order = order.unwrap_or(repo.sort_order());
    let mut entries: Vec<_> = repo.entries().iter().collect();
    entries.sort_by(|a, b| order.compare(a, b));

    output.print_entries(&entries, order);
    Ok(())
}

/// Show a single entry and remember it as the last opened
pub fn show<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    id: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_entry_id(&id, repo)?;
    let entry = repo
        .select(uuid)
        .context("Failed to open entry")?
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;

    output.print_entry(entry);
    Ok(())
}

/// Edit an entry's content in $EDITOR
pub fn edit<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    id: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_entry_id(&id, repo)?;
    let entry = repo
        .select(uuid)
        .context("Failed to open entry")?
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;

    let edited = edit_entry(&entry, &entry.content)?;
    if edited == entry.content {
        output.message("No changes.");
        return Ok(());
    }

    repo.update_content(uuid, &edited)
        .context("Failed to save content")?;
    output.success("Content saved");
    Ok(())
}

/// Replace an entry's content from `--content` or piped stdin
pub fn write<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    id: String,
    content: Option<String>,
    output: &Output,
) -> Result<()> {
    let uuid = parse_entry_id(&id, repo)?;

    let content = match content {
        Some(content) => content,
        None => read_piped_stdin()?.ok_or_else(|| {
            anyhow::anyhow!("No content given. Use --content or pipe text on stdin.")
        })?,
    };

    repo.update_content(uuid, &content)
        .context("Failed to save content")?;
    output.success(&format!("Saved {} byte(s)", content.len()));
    Ok(())
}

/// Rename an entry
pub fn rename<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    id: String,
    title: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_entry_id(&id, repo)?;

    if !repo
        .update_title(uuid, &title)
        .context("Failed to rename entry")?
    {
        bail!("Title must not be blank");
    }

    output.success(&format!("Renamed to: {}", title.trim()));
    Ok(())
}

/// Delete an entry
pub fn delete<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    id: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_entry_id(&id, repo)?;
    let entry = repo
        .get(uuid)
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;

    if output.should_prompt() {
        println!("Delete entry: {} - {}", entry.short_id(), entry.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    repo.delete(uuid).context("Failed to delete entry")?;

    output.success(&format!("Deleted entry: {}", uuid));
    Ok(())
}

/// What `marknote sort` should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAction {
    Show,
    Set(SortOrder),
    Toggle,
}

impl std::str::FromStr for SortAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toggle" => Ok(SortAction::Toggle),
            other => other.parse().map(SortAction::Set),
        }
    }
}

/// Show or change the sort order
pub fn sort<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    action: SortAction,
    output: &Output,
) -> Result<()> {
    let order = match action {
        SortAction::Show => {
            if output.is_json() {
                println!("{}", serde_json::json!({ "sort_order": repo.sort_order() }));
            } else if output.is_quiet() {
                println!("{}", repo.sort_order());
            } else {
                println!("Sort order: {}", repo.sort_order());
            }
            return Ok(());
        }
        SortAction::Set(order) => {
            repo.set_sort_order(order)
                .context("Failed to save sort order")?;
            order
        }
        SortAction::Toggle => repo
            .toggle_sort_order()
            .context("Failed to save sort order")?,
    };

    output.success(&format!("Sort order: {}", order));
    Ok(())
}

/// Render an entry to HTML
pub fn render<S: KeyValueStore>(
    repo: &mut EntryRepository<S>,
    id: String,
    output_path: Option<PathBuf>,
    open_after: bool,
    output: &Output,
) -> Result<()> {
    let uuid = parse_entry_id(&id, repo)?;
    let entry = repo
        .select(uuid)
        .context("Failed to open entry")?
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;
    let html = render_document(&entry.title, &entry.content);

    // Opening needs a file, so fall back to a temp one
    let target = match output_path {
        Some(path) => Some(path),
        None if open_after => Some(
            std::env::temp_dir().join(format!("marknote_{}.html", entry.short_id())),
        ),
        None => None,
    };

    let Some(path) = target else {
        print!("{}", html);
        return Ok(());
    };

    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    output.success(&format!("Rendered to {}", path.display()));

    if open_after {
        open::that(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    }
    Ok(())
}
