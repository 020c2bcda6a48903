use crate::app::{App, Focus};
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the saved-articles panel, oldest save first.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Saved;
    let max_width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = if app.bookmarks.is_empty() {
        vec![ListItem::new(Span::styled(
            "No saved articles (s to save)",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.bookmarks
            .list()
            .iter()
            .enumerate()
            .map(|(i, saved)| {
                let style = if is_focused && i == app.saved_selected {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else {
                    Style::default()
                };
                let title = truncate_to_width(&saved.article.title, max_width);
                ListItem::new(vec![
                    Line::from(Span::styled(title.into_owned(), style.add_modifier(Modifier::BOLD))),
                    Line::from(Span::styled(
                        format!("  {}", saved.article.source_name),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect()
    };

    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!("Saved ({})", app.bookmarks.len())),
    );

    f.render_widget(list, area);
}
