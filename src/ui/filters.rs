use crate::app::{App, InputMode};
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use super::help::centered_rect;

/// Render the one-line filter bar: query, sources, date range and sort.
pub fn render_bar(f: &mut Frame, app: &App, area: Rect) {
    let state = app.dashboard.state();
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);

    let query = if app.input_mode == InputMode::Search {
        Span::styled(
            format!("{}_", app.search_input),
            Style::default().fg(Color::Yellow),
        )
    } else if state.filter.query.is_empty() {
        Span::styled("-", label)
    } else {
        Span::styled(format!("\"{}\"", state.filter.query), value)
    };

    let sources = if state.filter.selected_sources.is_empty() {
        "All".to_string()
    } else {
        let joined = state
            .filter
            .selected_sources
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        truncate_to_width(&joined, 30).into_owned()
    };

    let mut spans = vec![
        Span::styled(" Search: ", label),
        query,
        Span::styled("  Sources: ", label),
        Span::styled(sources, value),
        Span::styled("  Date: ", label),
        Span::styled(state.filter.date_range.label(), value),
        Span::styled("  Sort: ", label),
        Span::styled(state.filter.sort_mode.label(), value),
    ];
    if state.has_active_filters() {
        spans.push(Span::styled(
            "  [filtered]",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the source picker overlay. `cursor` indexes the loaded sources.
pub fn render_source_picker(f: &mut Frame, app: &App, cursor: usize) {
    let sources = app.dashboard.sources();
    let overlay = centered_rect(50, 70, f.area());
    if overlay.width < 20 || overlay.height < 5 {
        return;
    }
    f.render_widget(Clear, overlay);

    let selected = &app.dashboard.state().filter.selected_sources;
    let visible = overlay.height.saturating_sub(2) as usize;
    let skip = cursor.saturating_sub(visible.saturating_sub(1));

    let items: Vec<ListItem> = sources
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(i, source)| {
            let check = if selected.contains(source) { "[x]" } else { "[ ]" };
            let style = if i == cursor {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(format!("{} {}", check, source), style))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" Sources ({} selected) ", selected.len())),
    );
    f.render_widget(list, overlay);
}
