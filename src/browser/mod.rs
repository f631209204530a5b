//! Page rendering through a disposable headless browser session.
//!
//! The pipeline depends only on the [`PageRenderer`] and [`RenderSession`]
//! traits. [`ChromeRenderer`] drives Chrome/Chromium over CDP
//! (chromiumoxide); tests substitute their own implementation.

mod binary;
#[cfg(feature = "browser")]
mod chrome;
#[cfg(feature = "browser")]
mod stealth;

pub use binary::{find_chrome, is_constrained_device};
#[cfg(feature = "browser")]
pub use chrome::ChromeRenderer;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while rendering a page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Browser not available: {0}")]
    Unavailable(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Navigation timed out after {secs}s for {url}")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("Failed to capture page: {0}")]
    Snapshot(String),
}

/// Snapshot of a page after navigation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// URL after all redirects.
    pub final_url: String,
    /// Full serialized markup.
    pub markup: String,
}

impl RenderedPage {
    pub fn new(final_url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            final_url: final_url.into(),
            markup: markup.into(),
        }
    }

    /// First `max_chars` characters of the markup with whitespace collapsed, for logs.
    pub fn snippet(&self, max_chars: usize) -> String {
        let head: String = self.markup.chars().take(max_chars).collect();
        head.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Source of isolated browser sessions. One session per pipeline run.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Start a fresh session. Nothing is shared with other sessions.
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// A live browser session.
///
/// Callers must call [`RenderSession::close`] once done. Dropping a session
/// without closing it must still release the underlying browser.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url`, wait for the network to settle and snapshot the page.
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError>;

    /// Tear the session down.
    async fn close(self: Box<Self>);
}

/// Renderer used when the crate is built without the `browser` feature.
#[cfg(not(feature = "browser"))]
pub struct ChromeRenderer {
    _config: crate::config::BrowserEngineConfig,
}

#[cfg(not(feature = "browser"))]
impl ChromeRenderer {
    pub fn new(config: crate::config::BrowserEngineConfig) -> Self {
        Self { _config: config }
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Err(RenderError::Unavailable(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_collapses_whitespace() {
        let page = RenderedPage::new("https://x.example/", "<html>\n  <body>\t hi  </body></html>");
        assert_eq!(page.snippet(1000), "<html> <body> hi </body></html>");
    }

    #[test]
    fn test_snippet_truncates() {
        let page = RenderedPage::new("https://x.example/", "abcdefghij");
        assert_eq!(page.snippet(4), "abcd");
    }
}
