use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use super::article::Article;
use super::types::RawArticle;
use crate::util::{canonical_article_url, clean_feed_text};

/// Title the provider substitutes for withdrawn articles.
pub const REMOVED_MARKER: &str = "[Removed]";

/// How many of the newest articles in a batch are flagged as trending.
pub const TRENDING_WINDOW: usize = 5;

/// Output of one normalisation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Valid, deduplicated articles in provider order.
    pub articles: Vec<Article>,
    /// Distinct non-empty source names, ascending, for the source picker.
    pub sources: Vec<String>,
    /// Records dropped as malformed or duplicate. Never surfaced to the user.
    pub rejected: usize,
}

/// Converts provider records into validated articles.
///
/// A record is dropped when its title is missing or equal to
/// [`REMOVED_MARKER`], or when it has no url or description. Duplicates by
/// id are dropped too, first occurrence wins. The first
/// [`TRENDING_WINDOW`] surviving articles are flagged as trending.
///
/// Never fails: a bad record only shrinks the batch.
pub fn normalize(records: Vec<RawArticle>) -> NormalizedBatch {
    let total = records.len();
    let mut seen: HashSet<Arc<str>> = HashSet::with_capacity(total);
    let mut articles = Vec::with_capacity(total);

    for record in records {
        let Some(mut article) = to_article(record) else {
            continue;
        };
        if !seen.insert(Arc::clone(&article.id)) {
            tracing::trace!(id = %article.id, "Dropping duplicate article");
            continue;
        }
        article.trending = articles.len() < TRENDING_WINDOW;
        articles.push(article);
    }

    let rejected = total - articles.len();
    if rejected > 0 {
        tracing::debug!(
            received = total,
            kept = articles.len(),
            rejected,
            "Dropped malformed or duplicate feed records"
        );
    }

    let sources = distinct_sources(&articles);
    NormalizedBatch {
        articles,
        sources,
        rejected,
    }
}

/// Distinct non-empty source names in ascending order.
pub fn distinct_sources(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .filter(|a| !a.source_name.is_empty())
        .map(|a| a.source_name.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn to_article(record: RawArticle) -> Option<Article> {
    let title = clean_feed_text(record.title.as_deref())?;
    if title == REMOVED_MARKER {
        return None;
    }
    let url = clean_feed_text(record.url.as_deref())?;
    let description = clean_feed_text(record.description.as_deref())?;

    let published_at = record.published_at.as_deref().and_then(parse_published);
    let id = canonical_article_url(&url).unwrap_or_else(|| synthesize_id(&url));

    let source_name = record
        .source
        .and_then(|s| clean_feed_text(s.name.as_deref()))
        .unwrap_or_default();

    Some(Article {
        id: Arc::from(id),
        title: Arc::from(title),
        description: Arc::from(description),
        content: clean_feed_text(record.content.as_deref()).map(Arc::from),
        url: Arc::from(url),
        image_url: clean_feed_text(record.url_to_image.as_deref()).map(Arc::from),
        source_name: Arc::from(source_name),
        published_at,
        trending: false,
    })
}

/// Parses the provider's date string (RFC 3339, falling back to RFC 2822).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Stable id for a record whose link is not a usable URL.
fn synthesize_id(link: &str) -> String {
    format!("news-{:x}", Sha256::digest(link.as_bytes()))
}
