//! UI rendering

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use marknote_core::i18n::{features, getting_started_steps, Text};
use marknote_core::markdown::word_count;
use marknote_core::{Page, SortOrder, Theme};

use super::app::{App, InputMode, SaveState};
use super::preview;

const SIDEBAR_WIDTH: u16 = 34;

/// Colors for one theme
#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    muted: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                accent: Color::Blue,
                muted: Color::DarkGray,
            },
            Theme::Dark => Self {
                fg: Color::Gray,
                bg: Color::Black,
                accent: Color::Cyan,
                muted: Color::DarkGray,
            },
        }
    }

    fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    fn dim(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.prefs.theme);
    frame.render_widget(Block::default().style(palette.base()), frame.area());

    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, &palette, outer_chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
        .split(outer_chunks[1]);

    draw_sidebar(frame, app, &palette, body_chunks[0]);
    match app.prefs.last_page {
        Page::Home => draw_home(frame, app, &palette, body_chunks[1]),
        Page::Articles => draw_articles(frame, app, &palette, body_chunks[1]),
    }

    match app.input_mode {
        InputMode::NewTitle | InputMode::Rename => {
            draw_title_input(frame, app, &palette, outer_chunks[2])
        }
        InputMode::ConfirmDelete => draw_confirm_delete(frame, app, outer_chunks[2]),
        InputMode::Normal | InputMode::Insert => {
            draw_status_bar(frame, app, &palette, outer_chunks[2])
        }
    }

    if app.show_help {
        draw_help_overlay(frame, app, &palette);
    }
}

/// App title on the left; save state, theme and language on the right
fn draw_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let title = Paragraph::new(Span::styled(
        format!(" {}", app.t(Text::MarkdownEditor)),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(title, area);

    let mut spans = Vec::new();
    match app.save_state {
        SaveState::Saving(_) => spans.push(Span::styled(
            app.t(Text::Saving),
            Style::default().fg(Color::Yellow),
        )),
        SaveState::Saved(_) => spans.push(Span::styled(
            format!("✓ {}", app.t(Text::Saved)),
            Style::default().fg(Color::Green),
        )),
        SaveState::Idle => {}
    }
    let theme = match app.prefs.theme {
        Theme::Light => app.t(Text::LightMode),
        Theme::Dark => app.t(Text::DarkMode),
    };
    spans.push(Span::styled(format!("  {}", theme), palette.dim()));
    spans.push(Span::styled(
        format!("  {} ", app.language().as_str().to_uppercase()),
        palette.dim(),
    ));

    let right = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);
    frame.render_widget(right, area);
}

/// Page navigation above the entry list
fn draw_sidebar(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    let nav_item = |page: Page, icon: &str, text: Text| {
        let label = format!(" {} {}", icon, app.t(text));
        if app.prefs.last_page == page {
            ListItem::new(label).style(
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            )
        } else {
            ListItem::new(label)
        }
    };
    let nav = List::new(vec![
        nav_item(Page::Home, "⌂", Text::Home),
        nav_item(Page::Articles, "≡", Text::Articles),
    ])
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(nav, chunks[0]);

    draw_entry_list(frame, app, palette, chunks[1]);
}

fn draw_entry_list(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let on_articles = app.prefs.last_page == Page::Articles;
    let border_style = if on_articles && app.input_mode != InputMode::Insert {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    // Shows what `s` switches to
    let sort_hint = match app.sort_order {
        SortOrder::Desc => format!(" ↑ {} ", app.t(Text::SortByOldest)),
        SortOrder::Asc => format!(" ↓ {} ", app.t(Text::SortByNewest)),
    };

    let block = Block::default()
        .title(format!(" {} ({}) ", app.t(Text::YourArticles), app.entries.len()))
        .title_bottom(Line::from(Span::styled(sort_hint, palette.dim())))
        .borders(Borders::ALL)
        .border_style(border_style);

    if app.entries.is_empty() {
        let empty = Paragraph::new(Span::styled(app.t(Text::NoArticles), palette.dim()))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let max_len = area.width.saturating_sub(5) as usize;
    let items: Vec<ListItem> = app
        .entries
        .iter()
        .map(|entry| {
            let marker = if app.open_id == Some(entry.id) { "▸ " } else { "  " };
            let title = Line::from(vec![
                Span::styled(marker, Style::default().fg(palette.accent)),
                Span::raw(truncate(&entry.title, max_len)),
            ]);
            let created = Line::from(Span::styled(
                format!("  {}", entry.created_at_jst()),
                palette.dim(),
            ));
            ListItem::new(vec![title, created])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.entry_index));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Welcome page with features and getting-started steps
fn draw_home(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let lang = app.language();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            app.t(Text::Welcome),
            bold.fg(palette.accent),
        )),
        Line::from(app.t(Text::Subtitle)),
        Line::from(""),
        Line::from(Span::styled(app.t(Text::StorageNotice), palette.dim())),
        Line::from(""),
    ];

    for feature in features(lang) {
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(palette.accent)),
            Span::styled(feature.title, bold),
        ]));
        lines.push(Line::from(format!("  {}", feature.description)));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(app.t(Text::GettingStarted), bold)));
    for (i, step) in getting_started_steps(lang).iter().enumerate() {
        lines.push(Line::from(format!("  {}. {}", i + 1, step)));
    }

    let block = Block::default()
        .title(format!(" {} ", app.t(Text::Home)))
        .borders(Borders::ALL);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Editor and preview for the open entry
fn draw_articles(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let Some(entry) = app.open_entry_ref() else {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(app.t(Text::SelectArticle), palette.dim())),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
        frame.render_widget(hint, area);
        return;
    };

    let panes = match (app.show_editor, app.show_preview) {
        (true, true) => vec![Constraint::Percentage(50), Constraint::Percentage(50)],
        (true, false) | (false, true) => vec![Constraint::Percentage(100)],
        (false, false) => {
            let hint = Paragraph::new(Line::from(Span::styled(
                format!(
                    "e: {}   p: {}",
                    app.t(Text::ShowEditor),
                    app.t(Text::ShowPreview)
                ),
                palette.dim(),
            )))
            .alignment(Alignment::Center)
            .block(Block::default().title(format!(" {} ", entry.title)).borders(Borders::ALL));
            frame.render_widget(hint, area);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(panes)
        .split(area);

    let mut next = chunks.iter().copied();
    if app.show_editor {
        if let Some(pane) = next.next() {
            draw_editor(frame, app, palette, &entry.title, pane);
        }
    }
    if app.show_preview {
        if let Some(pane) = next.next() {
            draw_preview(frame, app, palette, &entry.created_at_jst(), pane);
        }
    }
}

fn draw_editor(frame: &mut Frame, app: &App, palette: &Palette, title: &str, area: Rect) {
    let editing = app.input_mode == InputMode::Insert;
    let border_style = if editing {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_bottom(Line::from(Span::styled(
            format!(" e: {} ", app.t(Text::HideEditor)),
            palette.dim(),
        )))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);

    // Keep the cursor inside the pane; columns are terminal cells, so
    // full-width characters count twice
    let (line, _) = app.editor.position();
    let col = Line::from(app.editor.line_before_cursor()).width();
    let height = inner.height.max(1) as usize;
    let width = inner.width.max(1) as usize;
    let v_scroll = line.saturating_sub(height - 1);
    let h_scroll = col.saturating_sub(width - 1);

    let paragraph = Paragraph::new(app.editor.text())
        .block(block)
        .scroll((v_scroll as u16, h_scroll as u16));
    frame.render_widget(paragraph, area);

    if editing {
        let x = inner.x + (col - h_scroll) as u16;
        let y = inner.y + (line - v_scroll) as u16;
        frame.set_cursor_position((x, y));
    }
}

fn draw_preview(frame: &mut Frame, app: &App, palette: &Palette, created: &str, area: Rect) {
    let words = word_count(app.editor.text());
    let block = Block::default()
        .title(Line::from(vec![
            Span::raw(format!(" {} ", created)),
            Span::styled(format!("· {} words ", words), palette.dim()),
        ]))
        .title_bottom(Line::from(Span::styled(
            format!(" p: {} ", app.t(Text::HidePreview)),
            palette.dim(),
        )))
        .borders(Borders::ALL);

    let lines = preview::render(app.editor.text(), palette.accent);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let content = if let Some(msg) = &app.status_message {
        msg.clone()
    } else if app.input_mode == InputMode::Insert {
        "-- INSERT --  Esc:done".to_string()
    } else {
        "a:add  i:write  r:rename  d:del  s:sort  t:theme  L:lang  Tab:page  ?:help  q:quit"
            .to_string()
    };

    let paragraph = Paragraph::new(content).style(palette.dim());
    frame.render_widget(paragraph, area);
}

/// Draw the title prompt for new and renamed entries
fn draw_title_input(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let prefix = if app.input_mode == InputMode::Rename {
        "✎ "
    } else {
        "+ "
    };

    let input = app.title_input.text();
    let text = if input.is_empty() {
        Span::styled(app.t(Text::AddArticleTitle), palette.dim())
    } else {
        Span::raw(input)
    };

    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Yellow)),
        text,
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let typed = Line::from(app.title_input.line_before_cursor()).width();
    let cursor_x = area.x + Line::from(prefix).width() as u16 + typed as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

fn draw_confirm_delete(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.current_entry().map(|e| e.title.as_str()).unwrap_or("");
    let line = Line::from(vec![
        Span::styled(
            format!("{} '{}'? ", app.t(Text::DeleteArticle), title),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw("(y/n)"),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = frame.area();

    let popup_width = 54.min(area.width.saturating_sub(4));
    let popup_height = 26.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓    Open previous/next entry"),
        Line::from("  Enter       Open highlighted entry"),
        Line::from("  Tab         Switch Home / Articles"),
        Line::from("  J/K         Scroll preview"),
        Line::from(""),
        Line::from("Entries:"),
        Line::from(format!("  a           {}", app.t(Text::AddArticle))),
        Line::from("  i           Write (Esc to stop)"),
        Line::from("  E           Write in $EDITOR"),
        Line::from("  r           Rename"),
        Line::from(format!("  d           {}", app.t(Text::DeleteArticle))),
        Line::from("  s           Toggle sort order"),
        Line::from(""),
        Line::from("View:"),
        Line::from(format!("  e           {}", app.t(Text::HideEditor))),
        Line::from(format!("  p           {}", app.t(Text::HidePreview))),
        Line::from(format!("  t           {}", app.t(Text::DarkMode))),
        Line::from(format!("  L           {}", app.t(Text::SwitchLanguage))),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled("Press any key to close", palette.dim())]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD))
        .style(palette.base());

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, popup_area);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marknote_core::{EntryRepository, MemoryStore, Namespace, Preferences};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_home_page_translated() {
        let repo = EntryRepository::open(MemoryStore::new(), Namespace::articles()).unwrap();
        let mut app = App::new(&repo, Preferences::default());
        assert!(screen(&app).contains("Welcome to Markdown Editor"));

        // Wide characters leave a blank filler cell behind them
        app.prefs.language = marknote_core::Language::Ja;
        assert!(screen(&app).replace(' ', "").contains("使い方"));
    }

    #[test]
    fn test_articles_page_shows_entries() {
        let mut repo = EntryRepository::open(MemoryStore::new(), Namespace::articles()).unwrap();
        repo.add("First draft").unwrap();
        let entry = repo.add("Second draft").unwrap().unwrap();
        repo.update_content(entry.id, "# Heading").unwrap();

        let mut prefs = Preferences::default();
        prefs.last_page = Page::Articles;
        let app = App::new(&repo, prefs);
        let text = screen(&app);

        assert!(text.contains("First draft"));
        assert!(text.contains("Second draft"));
        assert!(text.contains("# Heading"));
    }

    #[test]
    fn test_cursor_after_wide_characters() {
        let mut repo = EntryRepository::open(MemoryStore::new(), Namespace::articles()).unwrap();
        let entry = repo.add("日本語").unwrap().unwrap();
        repo.update_content(entry.id, "記事記事").unwrap();

        let mut prefs = Preferences::default();
        prefs.last_page = Page::Articles;
        let mut app = App::new(&repo, prefs);
        app.input_mode = InputMode::Insert;

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();

        // Editor pane starts after the sidebar and its own border
        let text_start = SIDEBAR_WIDTH + 1;
        assert_eq!(cursor.x, text_start + 8);
        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(text_start, cursor.y)].symbol(), "記");
        assert_eq!(buffer[(text_start + 6, cursor.y)].symbol(), "事");
    }

    #[test]
    fn test_title_prompt_cursor_after_wide_characters() {
        let repo = EntryRepository::open(MemoryStore::new(), Namespace::articles()).unwrap();
        let mut app = App::new(&repo, Preferences::default());
        app.start_new_entry();
        app.title_input.insert_str("記事");

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();

        // "+ " then two full-width characters
        assert_eq!(cursor.x, 2 + 4);
        assert_eq!(cursor.y, 39);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }
}
