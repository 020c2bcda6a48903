use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use reqwest::redirect::Policy;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::Config;
use crate::feed::{Article, FetchError, NewsApiClient, NormalizedBatch, SavedArticle};
use crate::pipeline::{
    compute_view, reduce, Page, View, ViewAction, ViewState, PAGE_SIZE_OPTIONS,
};
use crate::refresh::{FetchCoordinator, FetchReport, FetchTrigger, RefreshScheduler};
use crate::share::{open_in_browser, share_article, Clipboard, NativeShare};
use crate::storage::{BookmarkChange, BookmarkStore, Database};
use crate::util::catch_task_panic;

/// How long a status message stays on screen.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Idle time after the last keystroke before the search query is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

// ============================================================================
// Dashboard
// ============================================================================

/// Connection badge shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// A fetch is outstanding (or none has finished yet).
    Checking,
    Connected,
    Error,
}

impl FeedStatus {
    pub fn label(self) -> &'static str {
        match self {
            FeedStatus::Checking => "Checking",
            FeedStatus::Connected => "Connected",
            FeedStatus::Error => "Error",
        }
    }
}

/// What the article area should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState<'a> {
    /// First fetch still running, nothing to show yet.
    Loading,
    /// Nothing has ever loaded and the last attempt failed.
    Failed(&'a str),
    /// Articles are loaded but the filters leave none.
    NoResults,
    Articles,
}

/// The working set and everything derived from it.
///
/// Owns the fetched articles and replaces them wholesale on each successful
/// fetch. The filtered/sorted view is recomputed synchronously after every
/// change to the working set or the [`ViewState`].
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Working set wrapped in Arc so a fetch swaps it in one move.
    articles: Arc<Vec<Article>>,
    sources: Vec<String>,
    state: ViewState,
    view: View,
    status: FeedStatus,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
    has_loaded: bool,
    loading: bool,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

impl Dashboard {
    pub fn new(state: ViewState) -> Self {
        let view = View {
            articles: Vec::new(),
            pagination: state.pagination,
        };
        Self {
            articles: Arc::new(Vec::new()),
            sources: Vec::new(),
            state,
            view,
            status: FeedStatus::Checking,
            error: None,
            last_updated: None,
            has_loaded: false,
            loading: false,
        }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Distinct source names of the working set, ascending.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn page(&self) -> Page<'_> {
        self.view.page()
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    pub fn display_state(&self) -> DisplayState<'_> {
        if self.articles.is_empty() {
            if let Some(error) = &self.error {
                return DisplayState::Failed(error);
            }
            if !self.has_loaded {
                return DisplayState::Loading;
            }
        }
        if self.view.is_empty() {
            DisplayState::NoResults
        } else {
            DisplayState::Articles
        }
    }

    /// Applies a reducer action against the local clock.
    pub fn dispatch(&mut self, action: ViewAction) {
        self.dispatch_at(action, &Local::now());
    }

    pub fn dispatch_at<Tz: TimeZone>(&mut self, action: ViewAction, now: &DateTime<Tz>) {
        self.state = reduce(&self.state, action);
        self.recompute_at(now);
    }

    /// Rebuilds the view and writes the clamped page index back.
    pub fn recompute_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.view = compute_view(&self.articles, &self.state, now);
        self.state.pagination = self.view.pagination;
    }

    /// Marks a fetch as started. The previous error is cleared so a retry
    /// after a failed first load shows the loading state.
    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.status = FeedStatus::Checking;
        self.error = None;
    }

    pub fn apply_fetch(&mut self, result: Result<NormalizedBatch, FetchError>, finished_at: DateTime<Utc>) {
        self.apply_fetch_at(result, finished_at, &Local::now());
    }

    /// Folds a finished fetch into the working set.
    ///
    /// Success replaces the articles and sources, clears the error, stamps
    /// `last_updated` and goes back to page 1. Failure keeps whatever was
    /// loaded before and records the error for the retry prompt.
    pub fn apply_fetch_at<Tz: TimeZone>(
        &mut self,
        result: Result<NormalizedBatch, FetchError>,
        finished_at: DateTime<Utc>,
        now: &DateTime<Tz>,
    ) {
        self.loading = false;
        match result {
            Ok(batch) => {
                self.articles = Arc::new(batch.articles);
                self.sources = batch.sources;
                self.error = None;
                self.status = FeedStatus::Connected;
                self.last_updated = Some(finished_at);
                self.has_loaded = true;
                self.state = reduce(&self.state, ViewAction::FirstPage);
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.status = FeedStatus::Error;
                if !self.has_loaded {
                    self.articles = Arc::new(Vec::new());
                    self.sources.clear();
                }
            }
        }
        self.recompute_at(now);
    }
}

// ============================================================================
// Application Events
// ============================================================================

/// Results delivered from background tasks to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    FetchCompleted(FetchReport),
    /// Writing a bookmark change to the database failed. The in-memory store
    /// already reflects the change.
    BookmarkPersistFailed { article_id: Arc<str>, error: String },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

impl From<FetchReport> for AppEvent {
    fn from(report: FetchReport) -> Self {
        AppEvent::FetchCompleted(report)
    }
}

// ============================================================================
// UI State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Articles,
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the search box.
    Search,
    /// Choosing sources; `cursor` indexes [`Dashboard::sources`].
    SourcePicker { cursor: usize },
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    pub dashboard: Dashboard,
    pub bookmarks: BookmarkStore,

    coordinator: Option<FetchCoordinator<NewsApiClient>>,
    scheduler: Option<RefreshScheduler>,
    bookmark_writer: Option<mpsc::UnboundedSender<BookmarkChange>>,
    event_tx: mpsc::Sender<AppEvent>,
    /// Latest fetch generation the dashboard has begun or applied.
    seen_generation: u64,

    pub focus: Focus,
    /// Index into the current page.
    pub selected: usize,
    /// Index into the saved list.
    pub saved_selected: usize,
    pub show_saved: bool,
    pub show_help: bool,
    pub input_mode: InputMode,

    pub search_input: String,
    /// Time of the last search keystroke not yet applied.
    pub search_debounce: Option<Instant>,

    /// Status message with expiry. Cow avoids allocating for static literals.
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Dirty flag to skip unnecessary frame renders.
    pub needs_redraw: bool,
    /// Loading spinner animation frame.
    pub spinner_frame: usize,
}

impl App {
    /// Builds the app. Does not fetch; call [`App::request_fetch`] once the
    /// event loop is running.
    ///
    /// A missing API key or bad endpoint is not fatal: the dashboard starts
    /// in the error state and refresh does nothing.
    pub fn new(
        config: Config,
        view_state: ViewState,
        db: Option<Database>,
        saved: Vec<SavedArticle>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self> {
        let http_client = build_http_client(&config)?;

        let mut dashboard = Dashboard::new(view_state);
        let coordinator = match NewsApiClient::from_config(&config, http_client) {
            Ok(client) => Some(FetchCoordinator::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "Feed client unavailable");
                dashboard.apply_fetch(Err(e), Utc::now());
                None
            }
        };

        let scheduler = match (&coordinator, config.refresh_interval()) {
            (Some(coordinator), Some(period)) => {
                let coordinator = coordinator.clone();
                let tx = event_tx.clone();
                let mut scheduler = RefreshScheduler::new(period, move || {
                    coordinator.spawn_fetch(FetchTrigger::Scheduled, tx.clone());
                });
                scheduler.set_enabled(config.auto_refresh);
                Some(scheduler)
            }
            _ => None,
        };

        let bookmark_writer = db.map(|db| spawn_bookmark_writer(db, event_tx.clone()));

        Ok(Self {
            config,
            dashboard,
            bookmarks: BookmarkStore::from_saved(saved),
            coordinator,
            scheduler,
            bookmark_writer,
            event_tx,
            seen_generation: 0,
            focus: Focus::Articles,
            selected: 0,
            saved_selected: 0,
            show_saved: false,
            show_help: false,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            search_debounce: None,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
        })
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Starts a fetch unless one is already running. Returns whether one started.
    pub fn request_fetch(&mut self, trigger: FetchTrigger) -> bool {
        let Some(coordinator) = &self.coordinator else {
            self.set_status("No feed configured (set NEWSDASH_API_KEY)");
            return false;
        };
        if coordinator.spawn_fetch(trigger, self.event_tx.clone()) {
            self.seen_generation = coordinator.generation();
            self.dashboard.begin_fetch();
            self.needs_redraw = true;
            true
        } else {
            self.set_status("Refresh already in progress");
            false
        }
    }

    /// Switches the dashboard to loading for a fetch the scheduler started
    /// off the event loop. Each fetch is picked up at most once, and never
    /// after its report has been applied.
    pub fn pick_up_background_fetch(&mut self) -> bool {
        let Some(coordinator) = &self.coordinator else {
            return false;
        };
        let generation = coordinator.generation();
        if generation <= self.seen_generation {
            return false;
        }
        self.seen_generation = generation;
        self.dashboard.begin_fetch();
        true
    }

    pub fn handle_fetch_report(&mut self, report: FetchReport) {
        self.seen_generation = self.seen_generation.max(report.generation);
        let ok = report.result.is_ok();
        self.dashboard.apply_fetch(report.result, report.finished_at);
        self.clamp_selection();
        if ok && report.trigger != FetchTrigger::Startup {
            let count = self.dashboard.articles().len();
            self.set_status(format!("Loaded {} articles", count));
        }
        self.needs_redraw = true;
    }

    // ========================================================================
    // Auto-refresh
    // ========================================================================

    pub fn auto_refresh_available(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.scheduler.as_ref().is_some_and(RefreshScheduler::is_enabled)
    }

    pub fn toggle_auto_refresh(&mut self) {
        let Some(scheduler) = self.scheduler.as_mut() else {
            self.set_status("Auto-refresh unavailable");
            return;
        };
        let minutes = scheduler.period().as_secs() / 60;
        if scheduler.toggle() {
            self.set_status(format!("Auto-refresh on (every {} min)", minutes.max(1)));
        } else {
            self.set_status("Auto-refresh off");
        }
    }

    /// Stops the timer and drops any fetch still on the wire.
    pub fn shutdown(&mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.stop();
        }
        if let Some(coordinator) = &self.coordinator {
            coordinator.shutdown();
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn dispatch(&mut self, action: ViewAction) {
        // Page size changes keep the cursor; everything else moves to a new page
        let resets_selection = !matches!(action, ViewAction::SetPageSize(_));
        self.dashboard.dispatch(action);
        if resets_selection {
            self.selected = 0;
        }
        self.clamp_selection();
        self.needs_redraw = true;
    }

    /// Next entry of the page-size picker after the current size.
    pub fn cycle_page_size(&mut self) {
        let current = self.dashboard.state().pagination.page_size;
        let next = PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .find(|&size| size > current)
            .unwrap_or(PAGE_SIZE_OPTIONS[0]);
        self.dispatch(ViewAction::SetPageSize(next));
        self.set_status(format!("{} articles per page", next));
    }

    pub fn clamp_selection(&mut self) {
        let page_len = self.dashboard.page().items.len();
        self.selected = self.selected.min(page_len.saturating_sub(1));
        self.saved_selected = self
            .saved_selected
            .min(self.bookmarks.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        match self.focus {
            Focus::Articles => {
                if self.selected + 1 < self.dashboard.page().items.len() {
                    self.selected += 1;
                }
            }
            Focus::Saved => {
                if self.saved_selected + 1 < self.bookmarks.len() {
                    self.saved_selected += 1;
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.focus {
            Focus::Articles => self.selected = self.selected.saturating_sub(1),
            Focus::Saved => self.saved_selected = self.saved_selected.saturating_sub(1),
        }
    }

    pub fn toggle_saved_panel(&mut self) {
        self.show_saved = !self.show_saved;
        if !self.show_saved {
            self.focus = Focus::Articles;
        }
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Articles if self.show_saved => Focus::Saved,
            _ => Focus::Articles,
        };
    }

    /// The article under the cursor in the focused panel.
    pub fn selected_article(&self) -> Option<&Article> {
        match self.focus {
            Focus::Articles => self.dashboard.view().page().items.get(self.selected),
            Focus::Saved => self
                .bookmarks
                .list()
                .get(self.saved_selected)
                .map(|s| &s.article),
        }
    }

    // ========================================================================
    // Search Input
    // ========================================================================

    pub fn push_search_char(&mut self, c: char) {
        if self.search_input.chars().count() >= crate::util::MAX_SEARCH_QUERY_LENGTH {
            self.set_status(format!(
                "Search query too long (max {} chars)",
                crate::util::MAX_SEARCH_QUERY_LENGTH
            ));
            return;
        }
        self.search_input.push(c);
        self.search_debounce = Some(Instant::now());
    }

    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
        self.search_debounce = Some(Instant::now());
    }

    /// Applies the typed query now, skipping the debounce.
    pub fn commit_search(&mut self) {
        self.search_debounce = None;
        if self.search_input != self.dashboard.state().filter.query {
            self.dispatch(ViewAction::SetQuery(self.search_input.clone()));
        }
    }

    /// Applies the typed query once typing has paused. Returns whether it did.
    pub fn apply_debounced_search(&mut self) -> bool {
        match self.search_debounce {
            Some(last) if last.elapsed() >= SEARCH_DEBOUNCE => {
                self.commit_search();
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Bookmarks
    // ========================================================================

    /// Saves or un-saves the selected article.
    pub fn toggle_bookmark(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        let change = self.bookmarks.toggle(&article);
        self.set_status(if change.is_saved() {
            "Article saved"
        } else {
            "Removed from saved"
        });
        if let Some(writer) = &self.bookmark_writer {
            if writer.send(change).is_err() {
                tracing::warn!("Bookmark writer stopped, change not persisted");
            }
        }
        self.clamp_selection();
        self.needs_redraw = true;
    }

    // ========================================================================
    // Share / Open
    // ========================================================================

    pub fn share_selected(&mut self, native: &dyn NativeShare, clipboard: &mut dyn Clipboard) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        match share_article(&article, native, clipboard) {
            Ok(outcome) => self.set_status(outcome.message()),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn open_selected(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        match open_in_browser(&article) {
            Ok(()) => self.set_status("Opening in browser..."),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// HTTP client with connection pooling and a capped redirect chain.
fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(config.request_timeout())
        .user_agent(concat!("newsdash/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }
        tracing::debug!(to = %url, hop = attempt.previous().len() + 1, "Following redirect");
        attempt.follow()
    })
}

/// Writes bookmark changes to the database one at a time, in order.
fn spawn_bookmark_writer(
    db: Database,
    event_tx: mpsc::Sender<AppEvent>,
) -> mpsc::UnboundedSender<BookmarkChange> {
    let (tx, mut rx) = mpsc::unbounded_channel::<BookmarkChange>();
    tokio::spawn(async move {
        while let Some(change) = rx.recv().await {
            let article_id = Arc::clone(&change.entry().article.id);
            let result = catch_task_panic(async {
                match &change {
                    BookmarkChange::Saved(saved) => db.insert_saved_article(saved).await,
                    BookmarkChange::Removed(saved) => {
                        db.delete_saved_article(saved.id()).await.map(|_| ())
                    }
                }
            })
            .await;

            let event = match result {
                Ok(Ok(())) => {
                    tracing::debug!(id = %article_id, saved = change.is_saved(), "Bookmark persisted");
                    continue;
                }
                Ok(Err(e)) => {
                    tracing::warn!(id = %article_id, error = %e, "Failed to persist bookmark");
                    AppEvent::BookmarkPersistFailed {
                        article_id,
                        error: e.to_string(),
                    }
                }
                Err(panic_msg) => {
                    tracing::error!(task = "bookmark_writer", error = %panic_msg, "Background task panicked");
                    AppEvent::TaskPanicked {
                        task: "bookmark_writer",
                        error: panic_msg,
                    }
                }
            };
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
    });
    tx
}
