use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use newsdash::app::{App, AppEvent, Dashboard, DisplayState};
use newsdash::config::Config;
use newsdash::feed::NewsApiClient;
use newsdash::pipeline::{reduce, DateRange, SortMode, ViewAction, ViewState};
use newsdash::refresh::{FetchCoordinator, FetchOutcome, FetchTrigger};
use newsdash::storage::{Database, DatabaseError};
use newsdash::ui;

/// Get the config directory path (~/.config/newsdash/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdash"))
}

#[derive(Parser, Debug)]
#[command(name = "newsdash", about = "Terminal dashboard for pharmaceutical and healthcare news")]
struct Args {
    /// Config file (default: ~/.config/newsdash/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch once, print a page to stdout and exit
    #[arg(long)]
    once: bool,

    /// Initial search query
    #[arg(long)]
    query: Option<String>,

    /// Only show articles from this source (repeatable)
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Date range: all, today, week, month
    #[arg(long)]
    range: Option<DateRange>,

    /// Sort order: newest, oldest, relevance
    #[arg(long)]
    sort: Option<SortMode>,

    /// Page to print with --once (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Articles per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Enable auto-refresh at startup
    #[arg(long)]
    auto_refresh: bool,

    /// Keep saved articles across runs
    #[arg(long)]
    persist_bookmarks: bool,
}

impl Args {
    /// Initial view state from the command line, on top of the config defaults.
    fn view_state(&self, config: &Config) -> ViewState {
        let page_size = self.page_size.unwrap_or(config.articles_per_page);
        let mut state = ViewState::with_page_size(page_size);
        if let Some(query) = &self.query {
            state = reduce(&state, ViewAction::SetQuery(query.clone()));
        }
        for source in &self.sources {
            if !state.filter.selected_sources.contains(source) {
                state = reduce(&state, ViewAction::ToggleSource(source.clone()));
            }
        }
        if let Some(range) = self.range {
            state = reduce(&state, ViewAction::SetDateRange(range));
        }
        if let Some(sort) = self.sort {
            state = reduce(&state, ViewAction::SetSortMode(sort));
        }
        state
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The TUI owns stdout; logs go to stderr and stay quiet unless RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.auto_refresh |= args.auto_refresh;
    config.persist_bookmarks |= args.persist_bookmarks;

    let view_state = args.view_state(&config);

    if args.once {
        return print_once(config, view_state, args.page).await;
    }

    let (db, saved) = if config.persist_bookmarks {
        open_bookmarks(&config_dir).await?
    } else {
        (None, Vec::new())
    };

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    let mut app = App::new(config, view_state, db, saved, event_tx)
        .context("Failed to create application")?;
    app.request_fetch(FetchTrigger::Startup);

    ui::run(&mut app, event_rx).await?;
    Ok(())
}

/// Opens the bookmark database and loads what was saved last time.
async fn open_bookmarks(
    config_dir: &std::path::Path,
) -> Result<(Option<Database>, Vec<newsdash::feed::SavedArticle>)> {
    std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let db_path = config_dir.join("bookmarks.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of newsdash appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };
    let saved = db
        .load_saved_articles()
        .await
        .context("Failed to load saved articles")?;
    tracing::info!(saved = saved.len(), "Restored bookmarks");
    Ok((Some(db), saved))
}

/// `--once`: fetch, run the pipeline and print the requested page.
async fn print_once(config: Config, view_state: ViewState, page: usize) -> Result<()> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let client = NewsApiClient::from_config(&config, http)?;
    let coordinator = FetchCoordinator::new(client);

    let mut dashboard = Dashboard::new(view_state);
    match coordinator.fetch(FetchTrigger::Startup).await {
        FetchOutcome::Completed(result) => dashboard.apply_fetch(result, Utc::now()),
        FetchOutcome::Skipped | FetchOutcome::Discarded => {
            anyhow::bail!("Fetch did not complete")
        }
    }
    // A successful fetch starts on page 1
    dashboard.dispatch(ViewAction::GoToPage(page));

    match dashboard.display_state() {
        DisplayState::Failed(error) => anyhow::bail!("{}", error),
        DisplayState::Loading | DisplayState::NoResults => {
            println!("No articles match the current filters.");
            return Ok(());
        }
        DisplayState::Articles => {}
    }

    let now = Utc::now();
    let page = dashboard.page();
    for article in page.items {
        let trending = if article.trending { " [trending]" } else { "" };
        println!("{}{}", article.title, trending);
        println!(
            "  {} · {}",
            article.source_name,
            ui::format_relative_time(article.published_at, now)
        );
        println!("  {}", article.url);
        println!();
    }
    let (from, to, total) = page.showing_range();
    println!(
        "Showing {} to {} of {} (page {}/{}) · updated {}",
        from,
        to,
        total,
        page.page_index,
        page.total_pages,
        Local::now().format("%H:%M")
    );
    Ok(())
}
