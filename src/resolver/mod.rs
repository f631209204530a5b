//! Media URL resolution from rendered page markup.
//!
//! Runs the static strategy chain from [`strategies`] over a markup snapshot
//! and returns the first candidate that validates as an absolute HTTP(S)
//! URL. Resolution is a pure function of the markup.

mod block;
pub mod strategies;

pub use block::{detect_block, BlockReason, BlockStatus};
pub use strategies::{ExtractionStrategy, Matcher, PostProcess, STRATEGIES};

use std::fmt;

use scraper::Html;
use tracing::{debug, trace};
use url::Url;

use strategies::{CompiledMatcher, COMPILED};

/// A resolved, directly fetchable media URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference(String);

impl MediaReference {
    /// Validate a cleaned candidate.
    ///
    /// Accepts only absolute `http://` or `https://` URLs with a host.
    pub fn parse(candidate: &str) -> Option<Self> {
        let candidate = candidate.trim();
        let lower = candidate.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return None;
        }
        let url = Url::parse(candidate).ok()?;
        url.host_str()?;
        Some(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub media: MediaReference,
    /// Name of the strategy that matched.
    pub strategy: &'static str,
}

/// Resolve the media URL embedded in rendered markup.
pub fn resolve_media(markup: &str) -> Option<Resolution> {
    let mut document: Option<Html> = None;

    for compiled in COMPILED.iter() {
        let strategy = compiled.strategy;
        let raw = match &compiled.matcher {
            CompiledMatcher::Meta(selector) => {
                let doc = document.get_or_insert_with(|| Html::parse_document(markup));
                doc.select(selector)
                    .next()
                    .and_then(|el| el.value().attr("content"))
                    .map(str::to_string)
            }
            CompiledMatcher::Pattern(regex) => regex
                .captures(markup)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        };

        let Some(raw) = raw else {
            trace!(strategy = strategy.name, "no match");
            continue;
        };

        let cleaned = match strategy.postprocess {
            PostProcess::None => raw,
            PostProcess::Unescape => clean_escaped_url(&raw),
        };

        match MediaReference::parse(&cleaned) {
            Some(media) => {
                debug!(strategy = strategy.name, "Found media URL");
                return Some(Resolution {
                    media,
                    strategy: strategy.name,
                });
            }
            None => {
                debug!(strategy = strategy.name, "Matched but not an absolute URL, skipping");
            }
        }
    }

    None
}

/// Undo backslash escaping from embedded JSON/JS and decode `&amp;`.
pub fn clean_escaped_url(raw: &str) -> String {
    unescape_backslashes(raw).replace("&amp;", "&")
}

/// Reverse backslash escaping.
///
/// `\uXXXX` is decoded to its character, `\x` becomes `x`, and escaped
/// backslashes are dropped so no escape sequence survives.
fn unescape_backslashes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                {
                    Some(decoded) => {
                        if decoded != '\\' {
                            out.push(decoded);
                        }
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    None => out.push('u'),
                }
            }
            Some('\\') | None => {}
            Some(other) => out.push(other),
        }
    }

    out
}
