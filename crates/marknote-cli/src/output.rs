//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use marknote_core::markdown::word_count;
use marknote_core::{Entry, Preferences, SortOrder};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single entry with its content
    pub fn print_entry(&self, entry: &Entry) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", entry.id);
                println!("Title:   {}", entry.title);
                println!("Created: {} JST", entry.created_at_jst());
                println!("Words:   {}", word_count(&entry.content));
                println!();
                if entry.content.is_empty() {
                    println!("(empty)");
                } else {
                    println!("{}", entry.content);
                }
            }
            OutputFormat::Json => print_json(entry),
            OutputFormat::Quiet => {
                println!("{}", entry.id);
            }
        }
    }

    /// Print a list of entries in display order
    pub fn print_entries(&self, entries: &[&Entry], order: SortOrder) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No entries yet. Add one with `marknote add <title>`.");
                    return;
                }
                for entry in entries {
                    println!(
                        "{} | {} | {}{}",
                        entry.short_id(),
                        entry.created_at_jst(),
                        truncate(&entry.title, 40),
                        preview_suffix(&entry.content)
                    );
                }
                println!("\n{} entr{} ({})", entries.len(), plural_y(entries.len()), order_label(order));
            }
            OutputFormat::Json => print_json(&entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print display preferences
    pub fn print_prefs(&self, prefs: &Preferences) {
        match self.format {
            OutputFormat::Human => {
                println!("theme:    {}", prefs.theme);
                println!("language: {}", prefs.language);
                println!("lastPage: {}", prefs.last_page.as_str());
            }
            OutputFormat::Json => print_json(prefs),
            OutputFormat::Quiet => {
                println!("{} {}", prefs.theme, prefs.language);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn order_label(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Desc => "newest first",
        SortOrder::Asc => "oldest first",
    }
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}

fn preview_suffix(content: &str) -> String {
    let line = truncate_line(content.trim_start(), 30);
    if line.is_empty() {
        String::new()
    } else {
        format!(" | {}", line)
    }
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max characters
pub fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        // Multi-byte titles are cut on character boundaries
        assert_eq!(truncate("マークダウン エディター", 6), "マーク...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
        assert_eq!(
            truncate_line("very long single line here", 10),
            "very lo..."
        );
    }

    #[test]
    fn test_preview_suffix() {
        assert_eq!(preview_suffix(""), "");
        assert_eq!(preview_suffix("\n# Hello\nmore"), " | # Hello");
    }
}
