//! Share and open actions for a single article.
//!
//! Sharing tries a [`NativeShare`] backend first and falls back to putting
//! the link on the clipboard. An unavailable share backend is never an
//! error: the caller only learns which path was taken.

use base64::Engine;
use std::io::Write;
use thiserror::Error;

use crate::feed::Article;
use crate::util::{validate_url_for_open, UrlValidationError};

#[derive(Debug, Error)]
pub enum ShareError {
    /// No share backend on this platform
    #[error("Sharing is not available")]
    Unavailable,

    /// The share backend exists but failed
    #[error("Share failed: {0}")]
    Failed(String),

    #[error("Failed to copy to clipboard: {0}")]
    Clipboard(#[from] std::io::Error),

    #[error("{0}")]
    InvalidUrl(#[from] UrlValidationError),

    #[error("Failed to open browser: {0}")]
    Launch(String),
}

/// Payload handed to a share backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl ShareData {
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.to_string(),
            text: article.description.to_string(),
            url: article.url.to_string(),
        }
    }
}

/// Which path [`share_article`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    CopiedToClipboard,
}

impl ShareOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ShareOutcome::Shared => "Article shared",
            ShareOutcome::CopiedToClipboard => "Link copied to clipboard",
        }
    }
}

/// A platform share dialog.
pub trait NativeShare {
    fn share(&self, data: &ShareData) -> Result<(), ShareError>;
}

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<(), ShareError>;
}

/// Terminals have no share dialog; always reports [`ShareError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNativeShare;

impl NativeShare for NoNativeShare {
    fn share(&self, _data: &ShareData) -> Result<(), ShareError> {
        Err(ShareError::Unavailable)
    }
}

/// Copies via the OSC 52 escape sequence.
///
/// Works in most modern terminals and over SSH. Writes to stdout by default,
/// bypassing the TUI backend's buffer.
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl Osc52Clipboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn copy(&mut self, text: &str) -> Result<(), ShareError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
        self.out
            .write_all(format!("\x1b]52;c;{}\x07", encoded).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Shares `article`, falling back to copying its url.
///
/// Only fails when the clipboard fallback itself fails.
pub fn share_article(
    article: &Article,
    native: &dyn NativeShare,
    clipboard: &mut dyn Clipboard,
) -> Result<ShareOutcome, ShareError> {
    let data = ShareData::from_article(article);
    match native.share(&data) {
        Ok(()) => {
            tracing::debug!(id = %article.id, "Shared via native dialog");
            return Ok(ShareOutcome::Shared);
        }
        Err(ShareError::Unavailable) => {
            tracing::debug!("Native share unavailable, copying link instead");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Native share failed, copying link instead");
        }
    }
    clipboard.copy(&data.url)?;
    Ok(ShareOutcome::CopiedToClipboard)
}

/// Opens the article in the system browser after checking it is http(s).
pub fn open_in_browser(article: &Article) -> Result<(), ShareError> {
    let url = validate_url_for_open(&article.url)?;
    open::that(url.as_str()).map_err(|e| ShareError::Launch(e.to_string()))?;
    tracing::debug!(url = %url, "Opened article in browser");
    Ok(())
}
