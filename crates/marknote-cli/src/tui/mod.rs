//! marknote TUI
//!
//! Terminal interface for writing markdown entries.
//!
//! ## Layout
//!
//! - Left: Home / Articles navigation and the entry list
//! - Right: the home page, or the editor and live preview of the open entry
//!
//! ## Navigation
//!
//! - j/k or ↑/↓: Open previous/next entry
//! - Tab: Switch between Home and Articles
//! - J/K: Scroll the preview
//! - q: Quit
//!
//! ## Commands
//!
//! - a: Add entry
//! - i: Write in the editor pane (Esc to stop)
//! - E: Write in $EDITOR
//! - r: Rename entry
//! - d: Delete entry
//! - s: Toggle sort order
//! - t / L: Toggle theme / language
//! - e / p: Show or hide editor / preview

mod app;
mod preview;
mod ui;

use std::io::stdout;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use marknote_core::{Config, DirStore, EntryRepository, Page, Preferences, StorageEvent, StorageWatcher};

use app::{App, AppRequest, InputMode};

use crate::commands;
use crate::editor;

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    let mut repo = commands::open_repository(&config)?;
    let prefs = Preferences::load(repo.store()).context("Failed to read preferences")?;

    // Follow writes from other marknote processes; the TUI still works without it
    let (_watcher, rx) = match StorageWatcher::spawn(repo.store()) {
        Ok((watcher, rx)) => (Some(watcher), Some(rx)),
        Err(e) => {
            warn!("Not following external changes: {:#}", e);
            (None, None)
        }
    };

    let mut app = App::new(&repo, prefs);
    info!(
        "TUI started with {} {} entries",
        repo.len(),
        repo.namespace().entity()
    );

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, &mut app, &mut repo, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result?;
    app.flush(&mut repo)
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    repo: &mut EntryRepository<DirStore>,
    mut rx: Option<UnboundedReceiver<StorageEvent>>,
) -> Result<()> {
    loop {
        app.tick();
        app.process_entry_events(repo);

        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            biased;

            // External writes (if the directory is being watched)
            storage_event = async {
                match rx.as_mut() {
                    Some(rx) => rx.recv().await,
                    // Never resolves without a watcher
                    None => std::future::pending::<Option<StorageEvent>>().await,
                }
            } => {
                match storage_event {
                    Some(event) => {
                        debug!("External change to {:?}", event.key);
                        if let Err(e) = app.apply_storage_event(repo, &event) {
                            app.set_status(format!("Failed to apply external change: {}", e));
                        }
                    }
                    None => {
                        warn!("Storage watcher stopped");
                        rx = None;
                    }
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        if let Err(e) = handle_key(app, repo, key) {
                            app.set_status(format!("Error: {:#}", e));
                        }
                    }
                }
            }
        }

        if let Some(AppRequest::ExternalEditor(id)) = app.request.take() {
            if let Err(e) = run_external_editor(terminal, app, repo, id) {
                app.set_status(format!("Editor failed: {:#}", e));
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, repo: &mut EntryRepository<DirStore>, key: KeyEvent) -> Result<()> {
    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, repo, key.code, key.modifiers),
        InputMode::Insert => handle_insert_mode(app, repo, key.code, key.modifiers),
        InputMode::NewTitle | InputMode::Rename => handle_title_mode(app, repo, key.code),
        InputMode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.delete_current(repo),
            _ => {
                app.input_mode = InputMode::Normal;
                Ok(())
            }
        },
    }
}

/// Handle key events in normal mode
fn handle_normal_mode(
    app: &mut App,
    repo: &mut EntryRepository<DirStore>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<()> {
    match code {
        // Quit
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        // Navigation
        KeyCode::Char('k') | KeyCode::Up => app.move_up(repo)?,
        KeyCode::Char('j') | KeyCode::Down => app.move_down(repo)?,
        KeyCode::Enter => app.select_current(repo)?,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_page(repo)?,
        KeyCode::Char('J') => app.scroll_preview_down(),
        KeyCode::Char('K') => app.scroll_preview_up(),

        // Entries
        KeyCode::Char('a') => app.start_new_entry(),
        KeyCode::Char('i') => {
            app.enter_insert_mode();
            if app.input_mode == InputMode::Insert {
                app.set_page(repo, Page::Articles)?;
            }
        }
        KeyCode::Char('E') => app.request_external_editor(),
        KeyCode::Char('r') => app.start_rename(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('s') => app.toggle_sort(repo)?,

        // View
        KeyCode::Char('t') => app.toggle_theme(repo)?,
        KeyCode::Char('L') => app.toggle_language(repo)?,
        KeyCode::Char('e') => app.toggle_editor(),
        KeyCode::Char('p') => app.toggle_preview(),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }

    Ok(())
}

/// Handle key events while typing into the editor pane
fn handle_insert_mode(
    app: &mut App,
    repo: &mut EntryRepository<DirStore>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<()> {
    let changed = match code {
        KeyCode::Esc => return app.exit_insert_mode(repo),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            return app.exit_insert_mode(repo);
        }

        KeyCode::Char(c) => {
            app.editor.insert_char(c);
            true
        }
        KeyCode::Enter => {
            app.editor.insert_char('\n');
            true
        }
        KeyCode::Tab => {
            app.editor.insert_str("  ");
            true
        }
        KeyCode::Backspace => app.editor.backspace(),
        KeyCode::Delete => app.editor.delete(),

        KeyCode::Left => {
            app.editor.left();
            false
        }
        KeyCode::Right => {
            app.editor.right();
            false
        }
        KeyCode::Up => {
            app.editor.up();
            false
        }
        KeyCode::Down => {
            app.editor.down();
            false
        }
        KeyCode::Home => {
            app.editor.home();
            false
        }
        KeyCode::End => {
            app.editor.end();
            false
        }
        _ => false,
    };

    if changed {
        app.content_edited(repo)?;
    }
    Ok(())
}

/// Handle key events in the title prompt
fn handle_title_mode(
    app: &mut App,
    repo: &mut EntryRepository<DirStore>,
    code: KeyCode,
) -> Result<()> {
    match code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Enter => app.submit_title(repo)?,
        KeyCode::Char(c) => app.title_input.insert_char(c),
        KeyCode::Backspace => {
            app.title_input.backspace();
        }
        KeyCode::Delete => {
            app.title_input.delete();
        }
        KeyCode::Left => app.title_input.left(),
        KeyCode::Right => app.title_input.right(),
        KeyCode::Home => app.title_input.home(),
        KeyCode::End => app.title_input.end(),
        _ => {}
    }
    Ok(())
}

/// Suspend the TUI and edit the open entry in $EDITOR
fn run_external_editor<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    repo: &mut EntryRepository<DirStore>,
    id: uuid::Uuid,
) -> Result<()> {
    let Some(entry) = app.open_entry_ref().filter(|e| e.id == id).cloned() else {
        return Ok(());
    };

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(cursor::Show)?;

    let edited = editor::edit_entry(&entry, app.editor.text());

    // Re-enter TUI before reporting anything
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    terminal.clear()?;

    let content = edited?;
    if content != app.editor.text() {
        app.set_content(repo, id, &content)?;
    }
    Ok(())
}
