//! Application event handling.
//!
//! Processes results sent back by background tasks: finished fetches and
//! bookmark writes that failed.

use crate::app::{App, AppEvent};
use crate::util::strip_control_chars;

/// Handle one event from a background task.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::FetchCompleted(report) => {
            if let Err(e) = &report.result {
                tracing::debug!(trigger = %report.trigger, error = %e, "Fetch failed");
            }
            app.handle_fetch_report(report);
        }
        AppEvent::BookmarkPersistFailed { article_id, error } => {
            tracing::warn!(id = %article_id, error = %error, "Bookmark not saved to disk");
            app.set_status(format!(
                "Could not save bookmark: {}",
                strip_control_chars(&error)
            ));
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Internal error in {}", task));
        }
    }
}
