//! Application state and logic

use std::time::{Duration, Instant};

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;
use uuid::Uuid;

use marknote_core::i18n::{tr, Text};
use marknote_core::{
    Entry, EntryEvent, EntryRepository, KeyValueStore, Language, Page, Preferences, SortOrder,
    StorageEvent, SyncOutcome,
};

/// How long status messages stay visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Quiet period after the last keystroke before "Saving..." becomes "Saved"
const SAVE_SETTLE: Duration = Duration::from_millis(500);

/// How long "Saved" stays visible
const SAVED_VISIBLE: Duration = Duration::from_secs(2);

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Typing into the selected entry's content
    Insert,
    /// Typing the title of a new entry
    NewTitle,
    /// Typing a new title for the selected entry
    Rename,
    /// Waiting for y/n before deleting the selected entry
    ConfirmDelete,
}

/// Save indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    /// Edits are being written; holds the time of the last one
    Saving(Instant),
    /// Everything is written; holds when that was noticed
    Saved(Instant),
}

/// What the user asked for that needs the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRequest {
    /// Edit the selected entry in $EDITOR
    ExternalEditor(Uuid),
}

/// Editable text with a cursor, counted in characters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    /// Cursor position in characters
    cursor: usize,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the text, keeping the cursor where it was if possible
    pub fn replace(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.cursor.min(self.text.chars().count());
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    /// Delete the character under the cursor
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.text.chars().count() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    /// Cursor as (line, column), both zero-based
    pub fn position(&self) -> (usize, usize) {
        let before: String = self.text.chars().take(self.cursor).collect();
        let line = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|s| s.chars().count())
            .unwrap_or(0);
        (line, col)
    }

    /// Text between the start of the cursor's line and the cursor
    pub fn line_before_cursor(&self) -> &str {
        let end = self.byte_index(self.cursor);
        let start = self.text[..end].rfind('\n').map(|i| i + 1).unwrap_or(0);
        &self.text[start..end]
    }

    fn line_lengths(&self) -> Vec<usize> {
        self.text.split('\n').map(|l| l.chars().count()).collect()
    }

    fn move_to(&mut self, line: usize, col: usize) {
        let lengths = self.line_lengths();
        let line = line.min(lengths.len().saturating_sub(1));
        let offset: usize = lengths[..line].iter().map(|len| len + 1).sum();
        self.cursor = offset + col.min(lengths.get(line).copied().unwrap_or(0));
    }

    pub fn up(&mut self) {
        let (line, col) = self.position();
        if line > 0 {
            self.move_to(line - 1, col);
        } else {
            self.cursor = 0;
        }
    }

    pub fn down(&mut self) {
        let (line, col) = self.position();
        if line + 1 < self.line_lengths().len() {
            self.move_to(line + 1, col);
        } else {
            self.cursor = self.text.chars().count();
        }
    }

    pub fn home(&mut self) {
        let (line, _) = self.position();
        self.move_to(line, 0);
    }

    pub fn end(&mut self) {
        let (line, _) = self.position();
        self.move_to(line, usize::MAX);
    }
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Single-line input for titles
    pub title_input: TextBuffer,
    /// Display preferences (theme, language, page)
    pub prefs: Preferences,
    /// Entries in display order
    pub entries: Vec<Entry>,
    /// Sort order the entries are shown in
    pub sort_order: SortOrder,
    /// Highlighted entry in the sidebar
    pub entry_index: usize,
    /// Entry open in the editor
    pub open_id: Option<Uuid>,
    /// Content of the open entry as being edited
    pub editor: TextBuffer,
    /// Whether the editor pane is visible
    pub show_editor: bool,
    /// Whether the preview pane is visible
    pub show_preview: bool,
    /// Scroll offset for the preview pane
    pub preview_scroll: u16,
    /// Save indicator
    pub save_state: SaveState,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Deferred work that needs the terminal
    pub request: Option<AppRequest>,
    /// Repository changes not yet reflected in `entries`
    events: broadcast::Receiver<EntryEvent>,
}

impl App {
    /// Create a new app showing the repository's current state
    pub fn new<S: KeyValueStore>(repo: &EntryRepository<S>, prefs: Preferences) -> Self {
        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            title_input: TextBuffer::default(),
            prefs,
            entries: Vec::new(),
            sort_order: repo.sort_order(),
            entry_index: 0,
            open_id: None,
            editor: TextBuffer::default(),
            show_editor: true,
            show_preview: true,
            preview_scroll: 0,
            save_state: SaveState::Idle,
            status_message: None,
            status_message_time: None,
            show_help: false,
            request: None,
            events: repo.subscribe(),
        };
        app.refresh(repo);
        if let Some(entry) = repo.selected() {
            app.open_entry(entry);
        }
        app
    }

    pub fn language(&self) -> Language {
        self.prefs.language
    }

    pub fn t(&self, text: Text) -> &'static str {
        tr(self.prefs.language, text)
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Advance time-based state: status timeout and the save indicator
    pub fn tick(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        self.save_state = match self.save_state {
            SaveState::Saving(last) if last.elapsed() >= SAVE_SETTLE => {
                SaveState::Saved(Instant::now())
            }
            SaveState::Saved(at) if at.elapsed() >= SAVED_VISIBLE => SaveState::Idle,
            state => state,
        };
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// The highlighted entry
    pub fn current_entry(&self) -> Option<&Entry> {
        self.entries.get(self.entry_index)
    }

    /// The entry open in the editor
    pub fn open_entry_ref(&self) -> Option<&Entry> {
        let id = self.open_id?;
        self.entries.iter().find(|e| e.id == id)
    }

    /// Rebuild the sidebar from the repository, keeping the highlight on
    /// the same entry when it still exists
    pub fn refresh<S: KeyValueStore>(&mut self, repo: &EntryRepository<S>) {
        let highlighted = self.current_entry().map(|e| e.id);
        self.sort_order = repo.sort_order();
        self.entries = repo.sorted().into_iter().cloned().collect();

        self.entry_index = highlighted
            .and_then(|id| self.entries.iter().position(|e| e.id == id))
            .unwrap_or(self.entry_index)
            .min(self.entries.len().saturating_sub(1));

        match self.open_id.map(|id| repo.get(id)) {
            Some(None) => self.close_entry(),
            Some(Some(entry)) => {
                let content = entry.content.clone();
                self.content_changed(entry.id, &content);
            }
            None => {}
        }
    }

    /// Bring the app up to date with everything the repository published
    /// since the last call
    pub fn process_entry_events<S: KeyValueStore>(&mut self, repo: &EntryRepository<S>) {
        let mut rebuild = false;
        loop {
            match self.events.try_recv() {
                Ok(EntryEvent::ContentChanged { id, content }) => {
                    self.content_changed(id, &content);
                }
                Ok(EntryEvent::SelectionChanged(_)) => {}
                Ok(_) => rebuild = true,
                Err(TryRecvError::Lagged(missed)) => {
                    debug!("Missed {} entry events, rebuilding", missed);
                    rebuild = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if rebuild {
            self.refresh(repo);
        }
    }

    fn content_changed(&mut self, id: Uuid, content: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            if entry.content != content {
                entry.content = content.to_string();
            }
        }
        // While typing, the buffer wins; it is written back on the next keystroke
        if self.open_id == Some(id)
            && self.input_mode != InputMode::Insert
            && self.editor.text() != content
        {
            self.editor.replace(content);
        }
    }

    fn open_entry(&mut self, entry: &Entry) {
        self.open_id = Some(entry.id);
        self.editor = TextBuffer::new(entry.content.clone());
        self.preview_scroll = 0;
        if let Some(pos) = self.entries.iter().position(|e| e.id == entry.id) {
            self.entry_index = pos;
        }
    }

    fn close_entry(&mut self) {
        self.open_id = None;
        self.editor = TextBuffer::default();
        if self.input_mode == InputMode::Insert {
            self.input_mode = InputMode::Normal;
        }
    }

    // ==================== Navigation ====================

    /// Switch between the home and articles pages
    pub fn set_page<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
        page: Page,
    ) -> anyhow::Result<()> {
        if self.prefs.last_page != page {
            self.prefs.set_last_page(repo.store_mut(), page)?;
        }
        Ok(())
    }

    pub fn toggle_page<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        let page = match self.prefs.last_page {
            Page::Home => Page::Articles,
            Page::Articles => Page::Home,
        };
        self.set_page(repo, page)
    }

    /// Open the highlighted entry
    pub fn select_current<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        let Some(id) = self.current_entry().map(|e| e.id) else {
            return Ok(());
        };
        self.flush(repo)?;
        if let Some(entry) = repo.select(id)?.cloned() {
            self.open_entry(&entry);
        }
        self.set_page(repo, Page::Articles)
    }

    pub fn move_up<S: KeyValueStore>(&mut self, repo: &mut EntryRepository<S>) -> anyhow::Result<()> {
        if self.entry_index > 0 {
            self.entry_index -= 1;
            self.select_current(repo)?;
        }
        Ok(())
    }

    pub fn move_down<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        if self.entry_index + 1 < self.entries.len() {
            self.entry_index += 1;
            self.select_current(repo)?;
        }
        Ok(())
    }

    pub fn scroll_preview_down(&mut self) {
        self.preview_scroll = self.preview_scroll.saturating_add(1);
    }

    pub fn scroll_preview_up(&mut self) {
        self.preview_scroll = self.preview_scroll.saturating_sub(1);
    }

    // ==================== Editing ====================

    /// Start typing into the open entry
    pub fn enter_insert_mode(&mut self) {
        if self.open_id.is_some() {
            if !self.show_editor {
                self.show_editor = true;
            }
            self.input_mode = InputMode::Insert;
        } else {
            let msg = self.t(Text::SelectArticle);
            self.set_status(msg);
        }
    }

    /// Persist the editor buffer after a keystroke
    pub fn content_edited<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        let Some(id) = self.open_id else {
            return Ok(());
        };
        self.save_state = SaveState::Saving(Instant::now());
        repo.update_content(id, self.editor.text())?;
        self.process_entry_events(repo);
        Ok(())
    }

    /// Write the buffer if it differs from what the repository holds
    pub fn flush<S: KeyValueStore>(&mut self, repo: &mut EntryRepository<S>) -> anyhow::Result<()> {
        let Some(id) = self.open_id else {
            return Ok(());
        };
        if repo.get(id).map(|e| e.content.as_str()) != Some(self.editor.text()) {
            repo.update_content(id, self.editor.text())?;
        }
        Ok(())
    }

    pub fn exit_insert_mode<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        self.input_mode = InputMode::Normal;
        self.flush(repo)
    }

    /// Replace the open entry's content, as after an external editor session
    pub fn set_content<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
        id: Uuid,
        content: &str,
    ) -> anyhow::Result<()> {
        if self.open_id == Some(id) {
            self.editor.replace(content);
        }
        self.content_edited(repo)
    }

    // ==================== Title input ====================

    pub fn start_new_entry(&mut self) {
        self.title_input = TextBuffer::default();
        self.input_mode = InputMode::NewTitle;
    }

    pub fn start_rename(&mut self) {
        let Some(title) = self.open_entry_ref().map(|e| e.title.clone()) else {
            let msg = self.t(Text::SelectArticle);
            self.set_status(msg);
            return;
        };
        self.title_input = TextBuffer::new(title);
        self.input_mode = InputMode::Rename;
    }

    pub fn cancel_input(&mut self) {
        self.title_input = TextBuffer::default();
        self.input_mode = InputMode::Normal;
    }

    /// Apply the title typed in NewTitle or Rename mode
    pub fn submit_title<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        let title = self.title_input.text().trim().to_string();
        let mode = self.input_mode;
        self.cancel_input();

        match mode {
            InputMode::NewTitle => {
                self.flush(repo)?;
                // Blank titles are ignored
                if let Some(entry) = repo.add(&title)? {
                    self.process_entry_events(repo);
                    self.open_entry(&entry);
                    self.set_page(repo, Page::Articles)?;
                    self.set_status(format!("{}: {}", self.t(Text::AddArticle), entry.title));
                }
            }
            InputMode::Rename => {
                if let Some(id) = self.open_id {
                    repo.update_title(id, &title)?;
                    self.process_entry_events(repo);
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ==================== Actions ====================

    pub fn request_delete(&mut self) {
        if self.current_entry().is_some() {
            self.input_mode = InputMode::ConfirmDelete;
        }
    }

    /// Delete the highlighted entry
    pub fn delete_current<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        self.input_mode = InputMode::Normal;
        let Some(entry) = self.current_entry().cloned() else {
            return Ok(());
        };
        if self.open_id == Some(entry.id) {
            self.close_entry();
        }
        repo.delete(entry.id)?;
        self.process_entry_events(repo);
        self.set_status(format!("{}: {}", self.t(Text::DeleteArticle), entry.title));
        Ok(())
    }

    pub fn toggle_sort<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        repo.toggle_sort_order()?;
        self.process_entry_events(repo);
        Ok(())
    }

    pub fn toggle_theme<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        self.prefs.toggle_theme(repo.store_mut())?;
        Ok(())
    }

    pub fn toggle_language<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
    ) -> anyhow::Result<()> {
        self.prefs.toggle_language(repo.store_mut())?;
        Ok(())
    }

    pub fn toggle_editor(&mut self) {
        self.show_editor = !self.show_editor;
        if !self.show_editor && self.input_mode == InputMode::Insert {
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    pub fn request_external_editor(&mut self) {
        match self.open_id {
            Some(id) => self.request = Some(AppRequest::ExternalEditor(id)),
            None => {
                let msg = self.t(Text::SelectArticle);
                self.set_status(msg);
            }
        }
    }

    // ==================== External changes ====================

    /// Apply a write made by another process
    pub fn apply_storage_event<S: KeyValueStore>(
        &mut self,
        repo: &mut EntryRepository<S>,
        event: &StorageEvent,
    ) -> anyhow::Result<()> {
        let prefs_changed = self.prefs.apply_storage_event(event);
        let outcome = repo.apply_storage_event(event)?;
        if !outcome.is_change() {
            if prefs_changed {
                self.set_status(format!("{} / {}", self.prefs.theme, self.prefs.language));
            }
            return Ok(());
        }

        self.process_entry_events(repo);

        if matches!(outcome, SyncOutcome::Reloaded) {
            self.set_status(format!("{} ({})", self.t(Text::YourArticles), self.entries.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marknote_core::{MemoryStore, Namespace, Theme};

    fn setup() -> (EntryRepository<MemoryStore>, App) {
        let repo = EntryRepository::open(MemoryStore::new(), Namespace::articles()).unwrap();
        let app = App::new(&repo, Preferences::default());
        (repo, app)
    }

    #[test]
    fn test_text_buffer_editing() {
        let mut buf = TextBuffer::new("ab");
        assert_eq!(buf.cursor(), 2);
        buf.insert_char('c');
        buf.left();
        buf.left();
        buf.insert_char('X');
        assert_eq!(buf.text(), "abXc");
        assert!(buf.backspace());
        assert!(buf.delete());
        assert_eq!(buf.text(), "ab");
        buf.home();
        assert!(!buf.backspace());
    }

    #[test]
    fn test_text_buffer_multibyte() {
        let mut buf = TextBuffer::new("記事");
        buf.left();
        buf.insert_char('の');
        assert_eq!(buf.text(), "記の事");
        assert!(buf.backspace());
        assert_eq!(buf.text(), "記事");
    }

    #[test]
    fn test_text_buffer_lines() {
        let mut buf = TextBuffer::new("first\nsecond line\nx");
        assert_eq!(buf.position(), (2, 1));
        buf.up();
        assert_eq!(buf.position(), (1, 1));
        buf.end();
        assert_eq!(buf.position(), (1, 11));
        buf.up();
        // Clamped to the shorter line
        assert_eq!(buf.position(), (0, 5));
        buf.down();
        buf.down();
        buf.down();
        assert_eq!(buf.cursor(), buf.text().chars().count());
    }

    #[test]
    fn test_line_before_cursor() {
        let mut buf = TextBuffer::new("# 見出し\n記事です");
        assert_eq!(buf.line_before_cursor(), "記事です");
        buf.left();
        buf.left();
        assert_eq!(buf.line_before_cursor(), "記事");
        buf.up();
        assert_eq!(buf.line_before_cursor(), "# ");
    }

    #[test]
    fn test_new_entry_flow() {
        let (mut repo, mut app) = setup();

        app.start_new_entry();
        for c in "Draft A".chars() {
            app.title_input.insert_char(c);
        }
        app.submit_title(&mut repo).unwrap();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.entries.len(), 1);
        assert_eq!(app.prefs.last_page, Page::Articles);
        let id = app.open_id.unwrap();
        assert_eq!(repo.selected_id(), Some(id));
    }

    #[test]
    fn test_blank_title_is_ignored() {
        let (mut repo, mut app) = setup();
        app.start_new_entry();
        app.title_input.insert_str("   ");
        app.submit_title(&mut repo).unwrap();
        assert!(repo.is_empty());
        assert!(app.open_id.is_none());
    }

    #[test]
    fn test_typing_persists_content() {
        let mut repo = EntryRepository::open(MemoryStore::new(), Namespace::articles()).unwrap();
        repo.add("Draft").unwrap();
        let mut app = App::new(&repo, Preferences::default());

        app.enter_insert_mode();
        assert_eq!(app.input_mode, InputMode::Insert);
        for c in "# Hello".chars() {
            app.editor.insert_char(c);
            app.content_edited(&mut repo).unwrap();
        }
        assert!(matches!(app.save_state, SaveState::Saving(_)));

        let id = app.open_id.unwrap();
        repo.load().unwrap();
        assert_eq!(repo.get(id).unwrap().content, "# Hello");
    }

    #[test]
    fn test_delete_closes_open_entry() {
        let (mut repo, mut app) = setup();
        repo.add("Gone").unwrap();
        app.refresh(&repo);
        app.select_current(&mut repo).unwrap();
        assert!(app.open_id.is_some());

        app.request_delete();
        assert_eq!(app.input_mode, InputMode::ConfirmDelete);
        app.delete_current(&mut repo).unwrap();

        assert!(app.open_id.is_none());
        assert!(app.entries.is_empty());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_toggles_persist() {
        let (mut repo, mut app) = setup();
        app.toggle_theme(&mut repo).unwrap();
        app.toggle_language(&mut repo).unwrap();
        app.toggle_sort(&mut repo).unwrap();

        let prefs = Preferences::load(repo.store()).unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.language, Language::Ja);
        assert_eq!(app.sort_order, SortOrder::Asc);
        assert_eq!(app.t(Text::Saved), "保存済み");
    }

    #[test]
    fn test_external_content_respects_insert_mode() {
        let (mut repo, mut app) = setup();
        let entry = repo.add("Shared").unwrap().unwrap();
        app.refresh(&repo);
        app.select_current(&mut repo).unwrap();
        let key = repo.namespace().content_key(entry.id);

        app.enter_insert_mode();
        app.editor.insert_str("mine");
        let event = StorageEvent::new(key.clone(), None, Some("theirs".to_string()));
        app.apply_storage_event(&mut repo, &event).unwrap();
        assert_eq!(app.editor.text(), "mine");

        app.input_mode = InputMode::Normal;
        let event = StorageEvent::new(key, None, Some("theirs, again".to_string()));
        app.apply_storage_event(&mut repo, &event).unwrap();
        assert_eq!(app.editor.text(), "theirs, again");
    }

    #[test]
    fn test_follows_repository_writes() {
        let (mut repo, mut app) = setup();

        // Writes that bypass the app still reach it
        let entry = repo.add("Elsewhere").unwrap().unwrap();
        app.process_entry_events(&repo);
        assert_eq!(app.entries.len(), 1);
        assert!(app.open_id.is_none());

        app.select_current(&mut repo).unwrap();
        repo.update_title(entry.id, "Renamed").unwrap();
        repo.update_content(entry.id, "from the CLI").unwrap();
        app.process_entry_events(&repo);
        assert_eq!(app.entries[0].title, "Renamed");
        assert_eq!(app.editor.text(), "from the CLI");

        app.enter_insert_mode();
        app.editor.replace("typing");
        repo.update_content(entry.id, "stale").unwrap();
        app.process_entry_events(&repo);
        assert_eq!(app.editor.text(), "typing");
        assert_eq!(app.entries[0].content, "stale");

        repo.delete(entry.id).unwrap();
        app.process_entry_events(&repo);
        assert!(app.entries.is_empty());
        assert!(app.open_id.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_save_indicator_settles() {
        let (_, mut app) = setup();
        app.save_state = SaveState::Saving(Instant::now() - SAVE_SETTLE);
        app.tick();
        assert!(matches!(app.save_state, SaveState::Saved(_)));
        app.save_state = SaveState::Saved(Instant::now() - SAVED_VISIBLE);
        app.tick();
        assert_eq!(app.save_state, SaveState::Idle);
    }
}
