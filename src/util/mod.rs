//! Utility functions shared across the crate.
//!
//! - **Text**: terminal-safe sanitising of feed text and width-aware truncation
//! - **URLs**: endpoint and article link validation, canonical article ids
//! - **Tasks**: panic capture for spawned background work
//!
//! ```
//! use newsdash::util::{canonical_article_url, truncate_to_width};
//!
//! let id = canonical_article_url("https://example.com/a#top").unwrap();
//! assert_eq!(id, "https://example.com/a");
//! assert_eq!(truncate_to_width("Biotechnology", 8), "Biote...");
//! ```

mod task;
mod text;
mod url_validator;

pub use task::catch_task_panic;

pub use text::{
    clean_feed_text, display_width, fold_case, strip_control_chars, truncate_to_width,
};
pub use url_validator::{
    canonical_article_url, validate_endpoint, validate_url_for_open, UrlValidationError,
};

/// Maximum accepted search query length, shared by the CLI and the TUI input.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
