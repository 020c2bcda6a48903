//! Configuration file parser for ~/.config/newsdash/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted and logged as a warning, since they are usually
//! typos of real keys.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::FeedQuery;

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "NEWSDASH_API_KEY";

/// Default feed endpoint (NewsAPI "everything" search).
pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Keywords OR-ed together into the feed query.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "pharmaceutical",
    "clinical trial",
    "FDA approval",
    "biotechnology",
    "drug discovery",
    "medical research",
    "medicine",
    "healthcare",
];

/// Largest page the provider will return in one response.
pub const MAX_FEED_PAGE_SIZE: u32 = 100;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The custom `Debug` impl masks `api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed API key (the `NEWSDASH_API_KEY` env var takes precedence).
    pub api_key: Option<String>,

    /// Feed endpoint URL. Must be HTTPS except for localhost.
    pub endpoint: String,

    /// Keywords combined into a single disjunctive query.
    pub keywords: Vec<String>,

    /// Response language (ISO 639-1).
    pub language: String,

    /// Provider-side sort order.
    pub sort_by: String,

    /// Number of records requested per fetch (1..=100).
    pub feed_page_size: u32,

    /// Auto-refresh interval in minutes. 0 disables the scheduler entirely.
    pub refresh_interval_minutes: u64,

    /// Whether auto-refresh is enabled at startup.
    pub auto_refresh: bool,

    /// Articles shown per dashboard page.
    pub articles_per_page: usize,

    /// Write bookmarks through to the SQLite database.
    pub persist_bookmarks: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            language: "en".to_string(),
            sort_by: "publishedAt".to_string(),
            feed_page_size: MAX_FEED_PAGE_SIZE,
            refresh_interval_minutes: 5,
            auto_refresh: false,
            articles_per_page: crate::pipeline::DEFAULT_PAGE_SIZE,
            persist_bookmarks: false,
            request_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint", &self.endpoint)
            .field("keywords", &self.keywords)
            .field("language", &self.language)
            .field("sort_by", &self.sort_by)
            .field("feed_page_size", &self.feed_page_size)
            .field("refresh_interval_minutes", &self.refresh_interval_minutes)
            .field("auto_refresh", &self.auto_refresh)
            .field("articles_per_page", &self.articles_per_page)
            .field("persist_bookmarks", &self.persist_bookmarks)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: &'static [&'static str] = &[
        "api_key",
        "endpoint",
        "keywords",
        "language",
        "sort_by",
        "feed_page_size",
        "refresh_interval_minutes",
        "auto_refresh",
        "articles_per_page",
        "persist_bookmarks",
        "request_timeout_secs",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing, empty or whitespace-only file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(content)?;
        config.validate()?;
        tracing::info!(
            endpoint = %config.endpoint,
            auto_refresh = config.auto_refresh,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Check value ranges, clamping where a sensible bound exists.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.articles_per_page == 0 {
            return Err(ConfigError::Invalid(
                "articles_per_page must be greater than 0".to_string(),
            ));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "keywords must contain at least one non-empty keyword".to_string(),
            ));
        }
        if self.feed_page_size == 0 || self.feed_page_size > MAX_FEED_PAGE_SIZE {
            let clamped = self.feed_page_size.clamp(1, MAX_FEED_PAGE_SIZE);
            tracing::warn!(
                requested = self.feed_page_size,
                clamped,
                "feed_page_size out of range, clamping"
            );
            self.feed_page_size = clamped;
        }
        Ok(())
    }

    /// Resolve the API key: environment variable first, then config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    /// Interval of the auto-refresh scheduler, or `None` when disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.refresh_interval_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes.saturating_mul(60))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Feed query parameters derived from this config.
    pub fn feed_query(&self) -> FeedQuery {
        FeedQuery {
            keywords: self
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            language: self.language.clone(),
            sort_by: self.sort_by.clone(),
            page_size: self.feed_page_size,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("newsdash_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.keywords.len(), 8);
        assert_eq!(config.language, "en");
        assert_eq!(config.sort_by, "publishedAt");
        assert_eq!(config.feed_page_size, 100);
        assert_eq!(config.refresh_interval_minutes, 5);
        assert!(!config.auto_refresh);
        assert_eq!(config.articles_per_page, 9);
        assert!(!config.persist_bookmarks);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newsdash_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.articles_per_page, 9);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.language, "en");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = write_config("partial", "articles_per_page = 12\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.articles_per_page, 12);
        assert_eq!(config.refresh_interval_minutes, 5);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
api_key = "test-key-123"
endpoint = "http://127.0.0.1:9000/v2/everything"
keywords = ["oncology", "vaccine"]
language = "de"
sort_by = "relevancy"
feed_page_size = 50
refresh_interval_minutes = 10
auto_refresh = true
articles_per_page = 6
persist_bookmarks = true
request_timeout_secs = 5
"#;
        let config = Config::from_toml_str(content).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("test-key-123"));
        assert_eq!(config.keywords, vec!["oncology", "vaccine"]);
        assert_eq!(config.language, "de");
        assert_eq!(config.feed_page_size, 50);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(600)));
        assert!(config.auto_refresh);
        assert_eq!(config.articles_per_page, 6);
        assert!(config.persist_bookmarks);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::from_toml_str("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::from_toml_str("articles_per_page = \"nine\"\n").is_err());
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::from_toml_str("theme = \"dark\"\nlanguage = \"fr\"\n").unwrap();
        assert_eq!(config.language, "fr");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = Config::from_toml_str("articles_per_page = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_blank_keywords_rejected() {
        let err = Config::from_toml_str("keywords = [\"  \"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_feed_page_size_clamped() {
        let config = Config::from_toml_str("feed_page_size = 500\n").unwrap();
        assert_eq!(config.feed_page_size, MAX_FEED_PAGE_SIZE);
        let config = Config::from_toml_str("feed_page_size = 0\n").unwrap();
        assert_eq!(config.feed_page_size, 1);
    }

    #[test]
    fn test_zero_interval_disables_scheduler() {
        let config = Config::from_toml_str("refresh_interval_minutes = 0\n").unwrap();
        assert_eq!(config.refresh_interval(), None);
    }

    #[test]
    fn test_feed_query_drops_blank_keywords() {
        let config =
            Config::from_toml_str("keywords = [\"oncology\", \" \", \" gene therapy \"]\n")
                .unwrap();
        assert_eq!(config.feed_query().keywords, vec!["oncology", "gene therapy"]);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            api_key: Some("super-secret-key-12345".to_string()),
            ..Config::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
