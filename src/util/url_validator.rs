use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// A plain-HTTP endpoint pointing somewhere other than the local machine.
    #[error("Insecure endpoint: HTTPS required (except localhost for testing)")]
    InsecureEndpoint,
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates the feed endpoint URL.
///
/// The API credential is attached to every request, so the endpoint must be
/// HTTPS. Plain HTTP is tolerated only for loopback hosts, which is what mock
/// servers in tests bind to.
///
/// ```
/// use newsdash::util::validate_endpoint;
///
/// assert!(validate_endpoint("https://newsapi.org/v2/everything").is_ok());
/// assert!(validate_endpoint("http://127.0.0.1:8080/v2/everything").is_ok());
/// assert!(validate_endpoint("http://example.com/v2/everything").is_err());
/// ```
pub fn validate_endpoint(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(&url) {
                return Err(UrlValidationError::InsecureEndpoint);
            }
            tracing::warn!(endpoint = %url, "Using non-HTTPS feed endpoint (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().is_none() {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Validates an article URL before handing it to the system browser.
///
/// Only http(s) URLs with a host are opened; anything else (`file:`,
/// `javascript:`, custom schemes) could launch arbitrary handlers.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(url)
}

/// Canonical form of an article link, used as the article identity.
///
/// Parses the link, drops the fragment and re-serialises it, so
/// `https://Example.com/a#top` and `https://example.com/a` collapse to the
/// same id. Returns `None` for links that are not absolute http(s) URLs.
pub fn canonical_article_url(url_str: &str) -> Option<String> {
    let mut url = Url::parse(url_str.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}

fn is_loopback_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host == "localhost" {
        return true;
    }
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_endpoint_accepted() {
        let url = validate_endpoint("https://newsapi.org/v2/everything").unwrap();
        assert_eq!(url.host_str(), Some("newsapi.org"));
    }

    #[test]
    fn test_http_localhost_endpoint_accepted() {
        assert!(validate_endpoint("http://localhost:9000/v2").is_ok());
        assert!(validate_endpoint("http://127.0.0.1:9000/v2").is_ok());
        assert!(validate_endpoint("http://[::1]:9000/v2").is_ok());
    }

    #[test]
    fn test_http_remote_endpoint_rejected() {
        assert!(matches!(
            validate_endpoint("http://newsapi.org/v2/everything"),
            Err(UrlValidationError::InsecureEndpoint)
        ));
    }

    #[test]
    fn test_other_scheme_rejected() {
        assert!(matches!(
            validate_endpoint("ftp://newsapi.org/"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_open_rejects_non_http() {
        assert!(validate_url_for_open("https://example.com/story").is_ok());
        assert!(validate_url_for_open("file:///etc/passwd").is_err());
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
        assert!(validate_url_for_open("not a url").is_err());
    }

    #[test]
    fn test_canonical_url_drops_fragment_and_lowercases_host() {
        assert_eq!(
            canonical_article_url("https://Example.com/story#comments").as_deref(),
            Some("https://example.com/story")
        );
        assert_eq!(
            canonical_article_url("  https://example.com/story  ").as_deref(),
            Some("https://example.com/story")
        );
    }

    #[test]
    fn test_canonical_url_rejects_relative_and_other_schemes() {
        assert_eq!(canonical_article_url("/relative/path"), None);
        assert_eq!(canonical_article_url("mailto:desk@example.com"), None);
    }
}
