//! Interactive editing support
//!
//! Opens $EDITOR for editing entry content, reads piped content, and asks
//! for confirmation.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process::Command;

use tempfile::NamedTempFile;

use marknote_core::Entry;

/// Open an entry's content in the user's preferred editor
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors. `content` is
/// passed separately because the TUI may hold unsaved edits. Returns the
/// text as it was when the editor exited.
pub fn edit_entry(entry: &Entry, content: &str) -> Result<String> {
    let editor = find_editor()?;
    let draft = draft_file(entry, content)?;

    let status = editor_command(&editor)?
        .arg(draft.path())
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    // Removed when `draft` drops
    fs::read_to_string(draft.path())
        .with_context(|| format!("Failed to read edited file: {:?}", draft.path()))
}

/// Temp file holding a draft, named after the entry so the editor shows
/// which one is open
fn draft_file(entry: &Entry, content: &str) -> Result<NamedTempFile> {
    let mut draft = tempfile::Builder::new()
        .prefix(&format!("marknote-{}-", entry.short_id()))
        .suffix(".md")
        .tempfile()
        .context("Failed to create temp file")?;
    draft
        .write_all(content.as_bytes())
        .and_then(|_| draft.flush())
        .with_context(|| format!("Failed to write temp file: {:?}", draft.path()))?;
    Ok(draft)
}

/// Build the command for an editor setting such as `code --wait`
fn editor_command(editor: &str) -> Result<Command> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("Editor command is empty");
    };
    let mut command = Command::new(program);
    command.args(parts);
    Ok(command)
}

/// Read all of stdin when it is piped
///
/// Returns `None` when stdin is a terminal, so callers can fall back to
/// the editor instead of blocking on input.
pub fn read_piped_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read content from stdin")?;
    Ok(Some(content))
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    if let Ok(editor) = env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    if let Ok(visual) = env::var("VISUAL") {
        if !visual.is_empty() {
            return Ok(visual);
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "code", "notepad"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marknote_core::{EntryRepository, MemoryStore, Namespace};

    fn entry() -> Entry {
        let mut repo = EntryRepository::open(MemoryStore::new(), Namespace::articles()).unwrap();
        repo.add("Draft").unwrap().unwrap()
    }

    #[test]
    fn test_draft_file_named_after_entry() {
        let entry = entry();
        let draft = draft_file(&entry, "# 下書き\n").unwrap();
        let path = draft.path().to_path_buf();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(&format!("marknote-{}-", entry.short_id())));
        assert!(name.ends_with(".md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# 下書き\n");

        // Two drafts of one entry never share a file
        let other = draft_file(&entry, "").unwrap();
        assert_ne!(other.path(), path);

        drop(draft);
        assert!(!path.exists());
    }

    #[test]
    fn test_editor_command_with_arguments() {
        let command = editor_command("code --wait -n").unwrap();
        assert_eq!(command.get_program(), "code");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["--wait", "-n"]);

        assert!(editor_command("   ").is_err());
    }

    #[test]
    fn test_find_editor_with_env() {
        // Depends on the environment; only check it doesn't panic
        let _ = find_editor();
    }

    #[test]
    fn test_command_exists() {
        #[cfg(unix)]
        assert!(command_exists("ls"));

        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }
}
