use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::types::{FeedResponse, RawArticle};
use crate::config::{Config, DEFAULT_KEYWORDS, MAX_FEED_PAGE_SIZE};
use crate::util::{validate_endpoint, UrlValidationError};

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const API_KEY_HEADER: &str = "X-Api-Key";

/// Errors that can occur while retrieving the feed.
///
/// All of them are recoverable from the user's point of view: the dashboard
/// keeps its last good article set and offers a retry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Non-2xx response. `message` comes from the error body when present.
    #[error("Feed error: {status} - {message}")]
    HttpStatus { status: u16, message: String },
    /// Server kept answering 429 Too Many Requests
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Fewer bytes arrived than Content-Length promised
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Body was not the expected JSON shape
    #[error("Malformed feed response: {0}")]
    Decode(String),
    /// The provider answered with `status: "error"`
    #[error("Feed provider error ({code}): {message}")]
    Provider { code: String, message: String },
    /// Valid response without any articles
    #[error("No recent articles found")]
    NoArticles,
    /// No credential in the environment or config file
    #[error("No API key configured (set NEWSDASH_API_KEY or api_key in config.toml)")]
    MissingApiKey,
    /// Endpoint failed validation
    #[error("Invalid feed endpoint: {0}")]
    InvalidEndpoint(#[from] UrlValidationError),
    /// The background fetch task died before producing a result
    #[error("Fetch task failed: {0}")]
    Task(String),
}

/// Query parameters sent with every feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// Keywords OR-ed together; multi-word keywords are quoted.
    pub keywords: Vec<String>,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            language: "en".to_string(),
            sort_by: "publishedAt".to_string(),
            page_size: MAX_FEED_PAGE_SIZE,
        }
    }
}

impl FeedQuery {
    /// The combined keyword expression, e.g. `medicine OR "clinical trial"`.
    pub fn expression(&self) -> String {
        self.keywords
            .iter()
            .map(|k| {
                if k.contains(char::is_whitespace) {
                    format!("\"{}\"", k)
                } else {
                    k.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

/// Backoff settings for 429/5xx responses and truncated bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Anything that can produce a batch of raw feed records.
///
/// The fetch coordinator is generic over this so tests can drive it without
/// a network.
pub trait ArticleSource: Send + Sync + 'static {
    fn fetch_articles(&self) -> impl Future<Output = Result<Vec<RawArticle>, FetchError>> + Send;
}

/// HTTP client for a NewsAPI-compatible "everything" endpoint.
pub struct NewsApiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    query: FeedQuery,
    timeout: Duration,
    retry: RetryPolicy,
}

impl NewsApiClient {
    pub fn new(http: reqwest::Client, endpoint: Url, api_key: SecretString, query: FeedQuery) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            query,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Builds a client from configuration, validating endpoint and credential.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Self, FetchError> {
        let api_key = config.resolve_api_key().ok_or(FetchError::MissingApiKey)?;
        let endpoint = validate_endpoint(&config.endpoint)?;
        Ok(Self::new(http, endpoint, SecretString::from(api_key), config.feed_query())
            .with_timeout(config.request_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Full request URL. The credential is sent as a header, never in the URL.
    pub fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &self.query.expression())
            .append_pair("language", &self.query.language)
            .append_pair("sortBy", &self.query.sort_by)
            .append_pair("pageSize", &self.query.page_size.to_string());
        url
    }

    /// Fetches one batch of records.
    ///
    /// - 429 and 5xx responses back off exponentially and retry
    /// - other non-2xx responses fail immediately with the provider's message
    /// - bodies over 10MB fail with [`FetchError::ResponseTooLarge`]
    /// - an empty article list fails with [`FetchError::NoArticles`]
    pub async fn fetch(&self) -> Result<Vec<RawArticle>, FetchError> {
        let url = self.request_url();
        let mut attempt = 0;

        let bytes = loop {
            let request = self
                .http
                .get(url.clone())
                .header(API_KEY_HEADER, self.api_key.expose_secret());

            let response = tokio::time::timeout(self.timeout, request.send())
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(FetchError::Network)?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.retry.max_retries {
                    return Err(FetchError::RateLimited(self.retry.max_retries));
                }
                let delay = self.retry.delay_for(attempt);
                tracing::warn!(
                    retry = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited by feed provider, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if status.is_server_error() {
                if attempt >= self.retry.max_retries {
                    let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await.ok();
                    return Err(status_error(status.as_u16(), body.as_deref()));
                }
                let delay = self.retry.delay_for(attempt);
                tracing::warn!(
                    status = %status,
                    retry = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Feed server error, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await.ok();
                return Err(status_error(status.as_u16(), body.as_deref()));
            }

            match read_limited_bytes(response, MAX_RESPONSE_SIZE).await {
                Ok(bytes) => break bytes,
                Err(FetchError::IncompleteResponse { expected, received })
                    if attempt < self.retry.max_retries =>
                {
                    tracing::debug!(
                        expected,
                        received,
                        attempt = attempt + 1,
                        "Retrying incomplete download"
                    );
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let body: FeedResponse =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

        if body.is_error() {
            return Err(FetchError::Provider {
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message: body
                    .message
                    .unwrap_or_else(|| "Please check your API key".to_string()),
            });
        }

        if body.articles.is_empty() {
            return Err(FetchError::NoArticles);
        }

        tracing::debug!(
            records = body.articles.len(),
            total_results = body.total_results,
            "Feed response received"
        );
        Ok(body.into_records())
    }
}

impl ArticleSource for NewsApiClient {
    fn fetch_articles(&self) -> impl Future<Output = Result<Vec<RawArticle>, FetchError>> + Send {
        self.fetch()
    }
}

/// Maps a non-2xx status to an error, pulling `message` out of a JSON body.
fn status_error(status: u16, body: Option<&[u8]>) -> FetchError {
    let message = body
        .and_then(|b| serde_json::from_slice::<FeedResponse>(b).ok())
        .and_then(|r| r.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Please check your API key".to_string());
    FetchError::HttpStatus { status, message }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
