//! Feed retrieval and normalisation.
//!
//! - [`fetcher`] talks to the NewsAPI-style HTTP endpoint with timeout,
//!   backoff and a response size cap
//! - [`normalizer`] turns raw records into validated, deduplicated [`Article`]s
//!
//! # Example
//!
//! ```ignore
//! use newsdash::feed::{normalize, NewsApiClient};
//!
//! let client = NewsApiClient::from_config(&config, reqwest::Client::new())?;
//! let batch = normalize(client.fetch().await?);
//! println!("{} articles from {} sources", batch.articles.len(), batch.sources.len());
//! ```

pub(crate) mod article;
mod fetcher;
mod normalizer;
mod types;

pub use article::{Article, SavedArticle, PLACEHOLDER_IMAGE};
pub use fetcher::{ArticleSource, FeedQuery, FetchError, NewsApiClient, RetryPolicy};
pub use normalizer::{
    distinct_sources, normalize, parse_published, NormalizedBatch, REMOVED_MARKER, TRENDING_WINDOW,
};
pub use types::{FeedResponse, RawArticle, RawSource};
