use crate::app::{App, InputMode};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        match app.input_mode {
            InputMode::Search => Cow::Borrowed("Type to search | ESC clear | ENTER apply"),
            InputMode::SourcePicker { .. } => {
                Cow::Borrowed("[j/k]move [space]toggle [c]lear sources [Esc]done")
            }
            InputMode::Normal if app.dashboard.error().is_some() => {
                Cow::Borrowed("[r]etry [/]search [f]sources [b]saved [?]help [q]uit")
            }
            InputMode::Normal => Cow::Borrowed(
                "[r]efresh [/]search [f]sources [d]ate [t]sort [n/p]page [s]ave [S]hare [o]pen [?]help [q]uit",
            ),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
