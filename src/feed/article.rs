use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;
use std::sync::Arc;
use url::Url;

use super::types::{RawArticle, RawSource};

/// Image used when an article has none (or its image fails to load).
pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1559757148-5c350d0d3c56?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&q=80";

/// Number of title characters carried into the placeholder image URL.
const PLACEHOLDER_TITLE_CHARS: usize = 20;

/// A validated article from the working set.
///
/// Immutable once built by the normalizer. Text fields are `Arc<str>` so the
/// filter/sort/paginate pipeline can clone articles freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Canonical link (or a content hash when the link is not a valid URL).
    pub id: Arc<str>,
    pub title: Arc<str>,
    pub description: Arc<str>,
    pub content: Option<Arc<str>>,
    pub url: Arc<str>,
    pub image_url: Option<Arc<str>>,
    /// May be empty; the presentation layer shows "Unknown source".
    pub source_name: Arc<str>,
    /// `None` when the feed's date string could not be parsed.
    pub published_at: Option<DateTime<Utc>>,
    /// One of the newest few articles of the latest fetched batch.
    pub trending: bool,
}

impl Article {
    /// Timestamp used for ordering. Unparsable dates sort as the oldest.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// The article image, or a placeholder carrying the start of the title.
    pub fn image_or_placeholder(&self) -> Cow<'_, str> {
        if let Some(image) = &self.image_url {
            return Cow::Borrowed(image.as_ref());
        }
        let label: String = self.title.chars().take(PLACEHOLDER_TITLE_CHARS).collect();
        let label = if label.is_empty() { "News".to_string() } else { label };
        match Url::parse(PLACEHOLDER_IMAGE) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("text", &label);
                Cow::Owned(url.into())
            }
            Err(_) => Cow::Borrowed(PLACEHOLDER_IMAGE),
        }
    }

    /// Converts back into the provider's record shape.
    ///
    /// Normalising the result yields this article again, which is how
    /// re-normalisation of an already-normalised set stays stable.
    pub fn to_raw(&self) -> RawArticle {
        RawArticle {
            source: Some(RawSource {
                id: None,
                name: Some(self.source_name.to_string()),
            }),
            author: None,
            title: Some(self.title.to_string()),
            description: Some(self.description.to_string()),
            url: Some(self.url.to_string()),
            url_to_image: self.image_url.as_deref().map(str::to_string),
            published_at: self
                .published_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            content: self.content.as_deref().map(str::to_string),
        }
    }
}

/// An article the user bookmarked, stamped with when it was saved.
///
/// Independent of the live feed: it keeps its own copy of the article and
/// survives re-fetches, filter changes and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArticle {
    pub article: Article,
    pub saved_at: DateTime<Utc>,
}

impl SavedArticle {
    pub fn id(&self) -> &str {
        &self.article.id
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds an article with sensible defaults for tests.
    pub fn article(id: &str, source: &str, published: Option<DateTime<Utc>>) -> Article {
        Article {
            id: Arc::from(id),
            title: Arc::from(format!("Title {}", id)),
            description: Arc::from(format!("Description {}", id)),
            content: None,
            url: Arc::from(id),
            image_url: None,
            source_name: Arc::from(source),
            published_at: published,
            trending: false,
        }
    }
}
