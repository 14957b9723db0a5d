//! marknote CLI
//!
//! Command-line interface for marknote - local-first markdown entries.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use marknote_core::{Config, SortOrder, StorageError};

mod commands;
mod editor;
mod output;
mod tui;

use commands::entry::SortAction;
use commands::prefs::PrefKey;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "marknote")]
#[command(about = "marknote - Local-first markdown editor")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Entity kind to work on (article, todo, ...)
    #[arg(long, global = true, value_name = "NAME")]
    entity: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Create a new entry
    Add {
        /// Entry title
        title: String,
    },
    /// List entries
    #[command(alias = "ls")]
    List {
        /// Override the stored sort order (asc, desc)
        #[arg(long)]
        order: Option<SortOrder>,
    },
    /// Show an entry with its content
    Show {
        /// Entry ID (full UUID or prefix)
        id: String,
    },
    /// Edit an entry's content in $EDITOR
    Edit {
        /// Entry ID (full UUID or prefix)
        id: String,
    },
    /// Replace an entry's content (from --content or stdin)
    Write {
        /// Entry ID (full UUID or prefix)
        id: String,
        /// New content
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Rename an entry
    Rename {
        /// Entry ID (full UUID or prefix)
        id: String,
        /// New title
        title: String,
    },
    /// Delete an entry
    #[command(alias = "rm")]
    Delete {
        /// Entry ID (full UUID or prefix)
        id: String,
    },
    /// Show or change the sort order (asc, desc, toggle)
    Sort {
        action: Option<SortAction>,
    },
    /// Render an entry to HTML
    Render {
        /// Entry ID (full UUID or prefix)
        id: String,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Open the rendered page in the browser
        #[arg(long)]
        open: bool,
    },
    /// Follow changes made by other marknote processes
    Watch,
    /// Show or set display preferences
    Prefs {
        key: Option<PrefKey>,
        /// New value, or "toggle"
        value: Option<String>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (storage, counts, preferences)
    Status,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, entity, log_file)
        key: String,
        /// Configuration value ("none" clears log_file)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:?}", e);
        if let Some(hint) = recovery_hint(&e) {
            eprintln!();
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Suggest a fix when a storage error is behind the failure
fn recovery_hint(error: &anyhow::Error) -> Option<String> {
    let storage = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())?;
    let suggestion = storage.recovery_suggestion()?;
    if storage.is_recoverable() {
        Some(format!("{} Your entries are unchanged; run the command again.", suggestion))
    } else {
        Some(suggestion.to_string())
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work on the file itself
    if let Some(Commands::Config { command }) = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(cli.config.as_ref(), &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, cli.config.as_ref(), &output)
            }
        };
    }

    let mut config =
        Config::load_with_cli_override(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(entity) = cli.entity {
        config.set_field("entity", &entity)?;
    }

    let tui_mode = matches!(&cli.command, Some(Commands::Tui) | None);
    init_logging(&config, tui_mode);

    if tui_mode {
        return tui::run(config).await;
    }

    let mut repo = commands::open_repository(&config)?;

    match cli.command {
        Some(Commands::Add { title }) => commands::entry::add(&mut repo, title, &output),
        Some(Commands::List { order }) => commands::entry::list(&repo, order, &output),
        Some(Commands::Show { id }) => commands::entry::show(&mut repo, id, &output),
        Some(Commands::Edit { id }) => commands::entry::edit(&mut repo, id, &output),
        Some(Commands::Write { id, content }) => {
            commands::entry::write(&mut repo, id, content, &output)
        }
        Some(Commands::Rename { id, title }) => {
            commands::entry::rename(&mut repo, id, title, &output)
        }
        Some(Commands::Delete { id }) => commands::entry::delete(&mut repo, id, &output),
        Some(Commands::Sort { action }) => {
            commands::entry::sort(&mut repo, action.unwrap_or(SortAction::Show), &output)
        }
        Some(Commands::Render { id, output: path, open }) => {
            commands::entry::render(&mut repo, id, path, open, &output)
        }
        Some(Commands::Watch) => commands::watch::run(&mut repo, &output).await,
        Some(Commands::Prefs { key, value }) => {
            commands::prefs::run(repo.store_mut(), key, value, &output)
        }
        Some(Commands::Status) => commands::status::show(&repo, &config, &output),
        Some(Commands::Tui) | Some(Commands::Config { .. }) | None => Ok(()),
    }
}

/// Initialize logging
///
/// Only initializes if MARKNOTE_LOG environment variable is set.
/// The TUI owns the terminal, so it always logs to a file
/// (config.log_file or default {data_dir}/debug.log); other commands log
/// to stderr.
fn init_logging(config: &Config, to_file: bool) {
    let Ok(log_level) = std::env::var("MARKNOTE_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "marknote_core={},marknote_cli={}",
        log_level, log_level
    ));

    if !to_file {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    }

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_recovery_hint_for_storage_errors() {
        let denied = StorageError::PermissionDenied {
            path: PathBuf::from("/data/storage/articles"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let error = anyhow::Error::new(denied).context("Failed to open storage");
        let hint = recovery_hint(&error).unwrap();
        assert!(hint.starts_with("Check file and directory permissions."));
        assert!(hint.ends_with("run the command again."));

        let invalid = StorageError::InvalidKey {
            key: String::new(),
            reason: "empty",
        };
        let hint = recovery_hint(&anyhow::Error::new(invalid)).unwrap();
        assert_eq!(hint, "Use a non-empty key.");
    }

    #[test]
    fn test_no_recovery_hint_for_other_errors() {
        let error = anyhow::anyhow!("No entry matches 'zz'");
        assert!(recovery_hint(&error).is_none());
    }
}
