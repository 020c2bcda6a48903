//! Help overlay listing every key, grouped by what it acts on.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "General",
        &[
            ("q / Ctrl+c", "Quit"),
            ("?", "Toggle this help"),
            ("r", "Refresh now (retry after an error)"),
            ("a", "Toggle auto-refresh"),
        ],
    ),
    (
        "Articles",
        &[
            ("j / k", "Move selection"),
            ("Tab", "Switch between articles and saved"),
            ("b", "Show or hide saved articles"),
            ("s", "Save / unsave article"),
            ("S", "Share article link"),
            ("o / Enter", "Open in browser"),
        ],
    ),
    (
        "Filters",
        &[
            ("/", "Search"),
            ("f", "Pick sources"),
            ("d", "Cycle date range"),
            ("t", "Cycle sort order"),
            ("c / Esc", "Clear filters"),
        ],
    ),
    (
        "Pages",
        &[
            ("n / p", "Next / previous page"),
            ("1-9", "Go to page"),
            ("g / G", "First / last page"),
            ("z", "Change articles per page"),
        ],
    ),
];

/// Render the help overlay on top of the dashboard.
pub fn render(f: &mut Frame) {
    let overlay = centered_rect(70, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let mut rows: Vec<Row> = Vec::new();
    for (i, (label, bindings)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            rows.push(Row::new(vec![String::new(), String::new()]));
        }
        rows.push(Row::new(vec![
            Line::from(Span::styled(
                format!("-- {} --", label),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ]));
        for (key, description) in bindings.iter() {
            rows.push(Row::new(vec![format!("  {}", key), description.to_string()]));
        }
    }

    let widths = [Constraint::Length(16), Constraint::Min(20)];
    let table = Table::new(rows, widths).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help (? to close) "),
    );
    f.render_widget(table, overlay);
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
