//! Render functions for the TUI.
//!
//! Lays out the dashboard (header, filter bar, cards, pagination footer,
//! status bar) and draws overlays on top.

use crate::app::{App, FeedStatus, InputMode};
use crate::pipeline::{visible_pages, PageMarker};
use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{articles, filters, help, saved, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 14;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    filters::render_bar(f, app, chunks[1]);
    render_main(f, app, chunks[2]);
    render_pagination(f, app, chunks[3]);
    status::render(f, app, chunks[4]);

    if let InputMode::SourcePicker { cursor } = app.input_mode {
        filters::render_source_picker(f, app, cursor);
    }
    if app.show_help {
        help::render(f);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let status_color = match dashboard.status() {
        FeedStatus::Checking => Color::Yellow,
        FeedStatus::Connected => Color::Green,
        FeedStatus::Error => Color::Red,
    };

    let mut spans = vec![
        Span::styled("● ", Style::default().fg(status_color)),
        Span::styled(dashboard.status().label(), Style::default().fg(status_color)),
    ];
    if let Some(updated) = dashboard.last_updated() {
        spans.push(Span::styled(
            format!("   Updated {}", updated.with_timezone(&Local).format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if app.auto_refresh_enabled() {
        spans.push(Span::styled("   Auto-refresh on", Style::default().fg(Color::Cyan)));
    }
    spans.push(Span::styled(
        format!("   {} articles", dashboard.articles().len()),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                " Pharma News Dashboard ",
                Style::default().add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(header, area);
}

fn render_main(f: &mut Frame, app: &App, area: Rect) {
    if app.show_saved {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
            .split(area);
        articles::render(f, app, chunks[0]);
        saved::render(f, app, chunks[1]);
    } else {
        articles::render(f, app, area);
    }
}

/// "Showing X to Y of Z" on the left, the page strip on the right.
fn render_pagination(f: &mut Frame, app: &App, area: Rect) {
    let page = app.dashboard.page();
    if page.total_items == 0 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)])
        .split(area);

    let (from, to, total) = page.showing_range();
    let showing = Paragraph::new(format!(" Showing {} to {} of {}", from, to, total))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(showing, chunks[0]);

    let mut spans = Vec::new();
    let nav = |enabled: bool| {
        if enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    spans.push(Span::styled("‹ Prev ", nav(page.has_prev())));
    for marker in visible_pages(page.page_index, page.total_pages) {
        match marker {
            PageMarker::Page(n) if n == page.page_index => spans.push(Span::styled(
                format!("[{}]", n),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            PageMarker::Page(n) => spans.push(Span::raw(format!(" {} ", n))),
            PageMarker::Gap => spans.push(Span::raw(" … ")),
        }
    }
    spans.push(Span::styled(" Next ›", nav(page.has_next())));
    spans.push(Span::styled(
        format!("  ({}/page) ", page.page_size),
        Style::default().fg(Color::DarkGray),
    ));

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
        chunks[1],
    );
}
