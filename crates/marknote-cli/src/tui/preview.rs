//! Markdown preview
//!
//! Turns pulldown-cmark events into styled ratatui lines.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use marknote_core::markdown;

/// Render markdown into lines for a Paragraph
pub fn render(text: &str, accent: Color) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(accent);
    for event in Parser::new_ext(text, markdown::options()) {
        renderer.event(event);
    }
    renderer.finish()
}

struct Renderer {
    accent: Color,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// Next number for each open list; `None` for bullet lists
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    table: Option<Table>,
}

#[derive(Default)]
struct Table {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    row: Vec<String>,
    cell: String,
}

impl Renderer {
    fn new(accent: Color) -> Self {
        Self {
            accent,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![Style::default()],
            lists: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            table: None,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(table) = &mut self.table {
            table.cell.push_str(text);
            return;
        }
        let style = self.style();
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn quote_prefix(&self) -> Option<Span<'static>> {
        (self.quote_depth > 0).then(|| {
            Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(self.accent).add_modifier(Modifier::DIM),
            )
        })
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans: Vec<Span<'static>> = self.quote_prefix().into_iter().collect();
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// Separate blocks with one empty line
    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => {
                let style = Style::default().fg(self.accent);
                for line in text.lines() {
                    self.current
                        .push(Span::styled(format!("    {}", line), style));
                    self.flush();
                }
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                if let Some(table) = &mut self.table {
                    table.cell.push_str(&code);
                } else {
                    let style = self.style().fg(self.accent);
                    self.current.push(Span::styled(format!("`{}`", code), style));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let style = Style::default().add_modifier(Modifier::DIM);
                for line in html.lines() {
                    self.current.push(Span::styled(line.to_string(), style));
                    self.flush();
                }
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    Style::default().add_modifier(Modifier::DIM),
                )));
                self.blank();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current
                    .push(Span::styled(marker, Style::default().fg(self.accent)));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let mut style = Style::default().fg(self.accent).add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.push_style(style);
                let hashes = "#".repeat(level as usize);
                self.current.push(Span::styled(
                    format!("{} ", hashes),
                    Style::default().add_modifier(Modifier::DIM),
                ));
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.current.push(Span::styled(
                            format!("    {}", lang),
                            Style::default().add_modifier(Modifier::DIM),
                        ));
                        self.flush();
                    }
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                self.current
                    .push(Span::styled(marker, Style::default().fg(self.accent)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { .. } => {
                self.push_style(Style::default().fg(self.accent).add_modifier(Modifier::UNDERLINED))
            }
            Tag::Image { .. } => {
                self.push_text("[image: ");
            }
            Tag::Table(_) => {
                self.flush();
                self.table = Some(Table::default());
            }
            Tag::TableCell => {
                if let Some(table) = &mut self.table {
                    table.cell.clear();
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.blank();
                } else {
                    self.flush();
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.blank();
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.blank();
                }
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style()
            }
            TagEnd::Image => self.push_text("]"),
            TagEnd::TableCell => {
                if let Some(table) = &mut self.table {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.draw_table(table);
                }
                self.blank();
            }
            _ => {}
        }
    }

    fn draw_table(&mut self, table: Table) {
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                table
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let border = Style::default().add_modifier(Modifier::DIM);
        for (i, row) in table.rows.iter().enumerate() {
            let header = i < table.header_rows;
            let style = if header {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans = Vec::new();
            for (col, width) in widths.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::styled(" │ ", border));
                }
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                let pad = width.saturating_sub(cell.chars().count());
                spans.push(Span::styled(format!("{}{}", cell, " ".repeat(pad)), style));
            }
            self.lines.push(Line::from(spans));

            if header && i + 1 == table.header_rows {
                let rule = widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.lines.push(Line::from(Span::styled(rule, border)));
            }
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_heading_and_paragraph() {
        let lines = render("# Title\n\nSome *words* here.", Color::Cyan);
        assert_eq!(text_of(&lines), vec!["# Title", "", "Some words here."]);

        let heading = &lines[0].spans[1];
        assert!(heading.style.add_modifier.contains(Modifier::BOLD));
        let emphasis = &lines[2].spans[1];
        assert!(emphasis.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_lists_and_tasks() {
        let lines = render("- one\n- [x] done\n\n3. third\n4. fourth", Color::Cyan);
        assert_eq!(
            text_of(&lines),
            vec!["• one", "• [x] done", "", "3. third", "4. fourth"]
        );
    }

    #[test]
    fn test_code_block() {
        let lines = render("```rust\nfn main() {}\n```", Color::Cyan);
        assert_eq!(text_of(&lines), vec!["    rust", "    fn main() {}"]);
    }

    #[test]
    fn test_strikethrough() {
        let lines = render("~~gone~~", Color::Cyan);
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::CROSSED_OUT));
    }

    #[test]
    fn test_table() {
        let lines = render("| a | bb |\n|---|----|\n| 1 | 2 |", Color::Cyan);
        assert_eq!(text_of(&lines), vec!["a │ bb", "──┼───", "1 │ 2 "]);
    }

    #[test]
    fn test_blockquote() {
        let lines = render("> quoted", Color::Cyan);
        assert_eq!(text_of(&lines), vec!["│ quoted"]);
    }

    #[test]
    fn test_empty() {
        assert!(render("", Color::Cyan).is_empty());
    }
}
