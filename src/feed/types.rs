use serde::{Deserialize, Serialize};

/// Top-level body returned by the feed provider.
///
/// Success bodies carry `status: "ok"` and `articles`; error bodies carry
/// `status: "error"` with `code` and `message`. Every field is optional so a
/// partial body still decodes and the caller decides what is missing.
/// Records stay as raw JSON until [`FeedResponse::into_records`] so one badly
/// shaped record cannot fail the whole body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub status: Option<String>,
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<serde_json::Value>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl FeedResponse {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }

    /// Decodes each record on its own. A record of the wrong shape becomes an
    /// empty `RawArticle`, which the normaliser rejects and counts.
    pub fn into_records(self) -> Vec<RawArticle> {
        self.articles
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).unwrap_or_else(|e| {
                    tracing::debug!(index, error = %e, "Malformed feed record");
                    RawArticle::default()
                })
            })
            .collect()
    }
}

/// One article record exactly as the provider sends it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub source: Option<RawSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_body() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Reuters"},
                "author": "Desk",
                "title": "FDA approves new therapy",
                "description": "The agency approved...",
                "url": "https://example.com/fda",
                "urlToImage": null,
                "publishedAt": "2024-05-01T12:00:00Z",
                "content": "Full text"
            }]
        }"#;
        let resp: FeedResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.is_error());
        assert_eq!(resp.total_results, Some(1));
        let records = resp.into_records();
        let article = &records[0];
        assert_eq!(
            article.source.as_ref().and_then(|s| s.name.as_deref()),
            Some("Reuters")
        );
        assert_eq!(article.url_to_image, None);
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_decode_error_body() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let resp: FeedResponse = serde_json::from_str(body).unwrap();
        assert!(resp.is_error());
        assert!(resp.articles.is_empty());
        assert_eq!(resp.code.as_deref(), Some("apiKeyInvalid"));
    }

    #[test]
    fn test_decode_missing_fields() {
        let resp: FeedResponse = serde_json::from_str(r#"{"articles":[{}]}"#).unwrap();
        assert_eq!(resp.into_records(), vec![RawArticle::default()]);
    }

    #[test]
    fn test_wrongly_typed_record_does_not_fail_body() {
        let body = r#"{
            "status": "ok",
            "articles": [
                {"source": {"name": "Reuters"}, "title": "FDA approves drug", "url": "https://example.com/1"},
                {"source": "Reuters", "title": 42, "url": "https://example.com/2"},
                null
            ]
        }"#;
        let resp: FeedResponse = serde_json::from_str(body).unwrap();
        let records = resp.into_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title.as_deref(), Some("FDA approves drug"));
        assert_eq!(records[1], RawArticle::default());
        assert_eq!(records[2], RawArticle::default());
    }
}
