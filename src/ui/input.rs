//! Input handling for the TUI.
//!
//! Keys are routed by [`InputMode`]: the help overlay captures everything,
//! then search typing, then the source picker, then the normal dashboard keys.

use crate::app::{App, InputMode};
use crate::pipeline::ViewAction;
use crate::refresh::FetchTrigger;
use crate::share::{NoNativeShare, Osc52Clipboard};
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if app.show_help {
        if matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return Action::Continue;
    }

    match app.input_mode {
        InputMode::Search => {
            handle_search_input(app, code);
            Action::Continue
        }
        InputMode::SourcePicker { cursor } => {
            handle_source_picker_input(app, code, cursor);
            Action::Continue
        }
        InputMode::Normal => handle_normal_input(app, code),
    }
}

fn handle_normal_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Esc => {
            if app.show_saved {
                app.toggle_saved_panel();
            } else if app.dashboard.state().has_active_filters() {
                app.search_input.clear();
                app.dispatch(ViewAction::ClearFilters);
            }
        }
        KeyCode::Char('?') => app.show_help = true,

        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Tab => app.switch_focus(),
        KeyCode::Char('b') => app.toggle_saved_panel(),

        // Pagination
        KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
            app.dispatch(ViewAction::NextPage)
        }
        KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
            app.dispatch(ViewAction::PrevPage)
        }
        KeyCode::Char('g') | KeyCode::Home => app.dispatch(ViewAction::FirstPage),
        KeyCode::Char('G') | KeyCode::End => {
            let last = app.dashboard.view().total_pages();
            app.dispatch(ViewAction::GoToPage(last));
        }
        KeyCode::Char(c @ '1'..='9') => {
            let page = c as usize - '0' as usize;
            if page <= app.dashboard.view().total_pages() {
                app.dispatch(ViewAction::GoToPage(page));
            }
        }
        KeyCode::Char('z') => app.cycle_page_size(),

        // Filters
        KeyCode::Char('/') => {
            app.search_input = app.dashboard.state().filter.query.clone();
            app.input_mode = InputMode::Search;
        }
        KeyCode::Char('f') => {
            if app.dashboard.sources().is_empty() {
                app.set_status("No sources loaded yet");
            } else {
                app.input_mode = InputMode::SourcePicker { cursor: 0 };
            }
        }
        KeyCode::Char('d') => {
            app.dispatch(ViewAction::CycleDateRange);
            let label = app.dashboard.state().filter.date_range.label();
            app.set_status(format!("Date: {}", label));
        }
        KeyCode::Char('t') => {
            app.dispatch(ViewAction::CycleSortMode);
            let label = app.dashboard.state().filter.sort_mode.label();
            app.set_status(format!("Sort: {}", label));
        }
        KeyCode::Char('c') => {
            app.search_input.clear();
            app.search_debounce = None;
            app.dispatch(ViewAction::ClearFilters);
            app.set_status("Filters cleared");
        }

        // Feed
        KeyCode::Char('r') => {
            let trigger = if app.dashboard.error().is_some() {
                FetchTrigger::Retry
            } else {
                FetchTrigger::Manual
            };
            app.request_fetch(trigger);
        }
        KeyCode::Char('a') => app.toggle_auto_refresh(),

        // Article actions
        KeyCode::Char('s') => app.toggle_bookmark(),
        KeyCode::Char('S') => {
            let mut clipboard = Osc52Clipboard::stdout();
            app.share_selected(&NoNativeShare, &mut clipboard);
        }
        KeyCode::Char('o') | KeyCode::Enter => app.open_selected(),
        _ => {}
    }
    Action::Continue
}

/// Typing into the search box. The query is applied after a pause (see
/// `handle_tick`) or immediately on Enter.
fn handle_search_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input.clear();
            app.commit_search();
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.commit_search();
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

fn handle_source_picker_input(app: &mut App, code: KeyCode, cursor: usize) {
    let count = app.dashboard.sources().len();
    match code {
        KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('q') => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let cursor = (cursor + 1).min(count.saturating_sub(1));
            app.input_mode = InputMode::SourcePicker { cursor };
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.input_mode = InputMode::SourcePicker {
                cursor: cursor.saturating_sub(1),
            };
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(source) = app.dashboard.sources().get(cursor).cloned() {
                app.dispatch(ViewAction::ToggleSource(source));
            }
        }
        KeyCode::Char('c') => app.dispatch(ViewAction::ClearSources),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppEvent, Focus};
    use crate::config::Config;
    use crate::feed::{normalize, RawArticle, RawSource};
    use crate::pipeline::{DateRange, SortMode, ViewState};
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn raw(n: usize, source: &str) -> RawArticle {
        RawArticle {
            source: Some(RawSource {
                id: None,
                name: Some(source.to_string()),
            }),
            title: Some(format!("Headline {}", n)),
            description: Some("Body".to_string()),
            url: Some(format!("https://example.com/{}", n)),
            published_at: Some(Utc::now().to_rfc3339()),
            ..RawArticle::default()
        }
    }

    fn loaded_app(n: usize) -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let config = Config {
            api_key: None,
            ..Config::default()
        };
        let mut app = App::new(config, ViewState::default(), None, Vec::new(), tx).unwrap();
        let mut records: Vec<RawArticle> = (1..n).map(|i| raw(i, "Reuters")).collect();
        records.push(raw(n, "STAT"));
        app.dashboard.apply_fetch(Ok(normalize(records)), Utc::now());
        (app, rx)
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _rx) = loaded_app(3);
        assert!(matches!(press(&mut app, KeyCode::Char('q')), Action::Quit));
        assert!(matches!(
            handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL),
            Action::Quit
        ));
    }

    #[tokio::test]
    async fn test_page_keys() {
        let (mut app, _rx) = loaded_app(20);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.dashboard.state().pagination.page_index, 2);
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.dashboard.state().pagination.page_index, 3);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.dashboard.state().pagination.page_index, 3);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.dashboard.state().pagination.page_index, 1);
        // Beyond the last page is ignored
        press(&mut app, KeyCode::Char('7'));
        assert_eq!(app.dashboard.state().pagination.page_index, 1);
    }

    #[tokio::test]
    async fn test_cycle_keys() {
        let (mut app, _rx) = loaded_app(3);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.dashboard.state().filter.date_range, DateRange::Today);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.dashboard.state().filter.sort_mode, SortMode::Oldest);
        press(&mut app, KeyCode::Char('c'));
        assert!(!app.dashboard.state().has_active_filters());
    }

    #[tokio::test]
    async fn test_search_mode_commit_and_cancel() {
        let (mut app, _rx) = loaded_app(12);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Search);
        for c in "headline 12".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        // Typing 'q' in search mode must not quit
        assert!(matches!(press(&mut app, KeyCode::Backspace), Action::Continue));
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.dashboard.state().filter.query, "headline 12");
        assert_eq!(app.dashboard.view().articles.len(), 1);

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.dashboard.state().filter.query, "");
        assert_eq!(app.dashboard.view().articles.len(), 12);
    }

    #[tokio::test]
    async fn test_source_picker_toggles() {
        let (mut app, _rx) = loaded_app(4);
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.input_mode, InputMode::SourcePicker { cursor: 1 });
        press(&mut app, KeyCode::Char(' '));
        assert!(app.dashboard.state().filter.selected_sources.contains("STAT"));
        assert_eq!(app.dashboard.view().articles.len(), 1);

        press(&mut app, KeyCode::Char('c'));
        assert!(app.dashboard.state().filter.selected_sources.is_empty());
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_help_overlay_captures_keys() {
        let (mut app, _rx) = loaded_app(3);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.dashboard.state().pagination.page_index, 1);
        assert!(matches!(press(&mut app, KeyCode::Char('q')), Action::Continue));
        assert!(!app.show_help);
    }

    #[tokio::test]
    async fn test_save_and_saved_panel() {
        let (mut app, _rx) = loaded_app(3);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.bookmarks.len(), 1);
        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Saved);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_saved);
        assert_eq!(app.focus, Focus::Articles);
    }
}
