use crate::app::{App, DisplayState, Focus};
use crate::feed::Article;
use crate::util::truncate_to_width;
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::loop_runner::SPINNER_FRAMES;

const SPINNER: [char; SPINNER_FRAMES] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Width a column of cards needs before another column is added.
const MIN_CARD_WIDTH: u16 = 40;
const MAX_COLUMNS: usize = 3;

/// Format a publish time relative to `now`.
///
/// Under an hour (or in the future) is "just now"; under a day "Nh ago";
/// under a week "Nd ago"; anything older shows the short date.
pub fn format_relative_time(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = timestamp else {
        return String::new();
    };

    let diff = now.signed_duration_since(ts);
    if diff.num_hours() < 1 {
        return "just now".to_string();
    }
    if diff.num_hours() < 24 {
        return format!("{}h ago", diff.num_hours());
    }
    if diff.num_days() < 7 {
        return format!("{}d ago", diff.num_days());
    }
    ts.format("%b %d").to_string()
}

/// Render the article card grid, or the loading/error/empty placeholder.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    match app.dashboard.display_state() {
        DisplayState::Loading => {
            let frame = SPINNER[app.spinner_frame % SPINNER_FRAMES];
            render_message(f, area, format!("{} Loading articles...", frame), Color::Cyan);
        }
        DisplayState::Failed(error) => {
            render_message(
                f,
                area,
                format!("{}\n\nPress r to retry", error),
                Color::Red,
            );
        }
        DisplayState::NoResults => {
            let hint = if app.dashboard.articles().is_empty() {
                "No recent articles found"
            } else {
                "No articles match your filters\n\nPress c to clear filters"
            };
            render_message(f, area, hint.to_string(), Color::Gray);
        }
        DisplayState::Articles => render_grid(f, app, area),
    }
}

fn render_message(f: &mut Frame, area: Rect, text: String, color: Color) {
    let top = area.height.saturating_sub(3) / 2;
    let padded = format!("{}{}", "\n".repeat(top as usize), text);
    let paragraph = Paragraph::new(padded)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title("Articles"));
    f.render_widget(paragraph, area);
}

fn render_grid(f: &mut Frame, app: &App, area: Rect) {
    let page = app.dashboard.page();
    if page.items.is_empty() || area.height < 4 {
        return;
    }

    let columns = ((area.width / MIN_CARD_WIDTH) as usize).clamp(1, MAX_COLUMNS);
    let rows = page.items.len().div_ceil(columns);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);

    let now = Utc::now();
    let focused = app.focus == Focus::Articles;

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);

        for (col, cell) in cells.iter().enumerate() {
            let index = row * columns + col;
            let Some(article) = page.items.get(index) else {
                break;
            };
            let selected = focused && index == app.selected;
            let saved = app.bookmarks.is_saved(&article.id);
            render_card(f, article, *cell, selected, saved, now);
        }
    }
}

fn render_card(
    f: &mut Frame,
    article: &Article,
    area: Rect,
    selected: bool,
    saved: bool,
    now: DateTime<Utc>,
) {
    let inner_width = area.width.saturating_sub(2) as usize;

    let mut meta = vec![Span::styled(
        article.source_name.to_string(),
        Style::default().fg(Color::Cyan),
    )];
    let time = format_relative_time(article.published_at, now);
    if !time.is_empty() {
        meta.push(Span::styled(
            format!(" · {}", time),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if article.trending {
        meta.push(Span::styled(
            " ▲ Trending",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));
    }

    let lines = vec![
        Line::from(meta),
        Line::from(""),
        Line::from(Span::raw(article.description.to_string())),
    ];

    let marker = if saved { "★ " } else { "" };
    let title = format!(
        " {}{} ",
        marker,
        truncate_to_width(&article.title, inner_width.saturating_sub(4))
    );

    let border_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let card = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        );
    f.render_widget(card, area);
}
