//! The ordered extraction strategy chain.
//!
//! Order is priority: structured metadata first, then pattern fallbacks over
//! the raw markup. The first strategy yielding a valid media URL wins, so a
//! caller preferring HD over SD must reorder the pattern entries.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

/// How a strategy pulls a raw candidate out of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// `content` attribute of the first element matching a CSS selector.
    MetaContent(&'static str),
    /// First capture group of a regex over the raw markup.
    Pattern(&'static str),
}

/// Cleanup applied to a raw candidate before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Value is already decoded (attribute values come out of the HTML parser).
    None,
    /// Reverse JSON/JS backslash escaping and decode `&amp;`.
    Unescape,
}

/// A named extraction rule.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionStrategy {
    pub name: &'static str,
    pub matcher: Matcher,
    pub postprocess: PostProcess,
}

const fn meta(name: &'static str, selector: &'static str) -> ExtractionStrategy {
    ExtractionStrategy {
        name,
        matcher: Matcher::MetaContent(selector),
        postprocess: PostProcess::None,
    }
}

const fn pattern(name: &'static str, regex: &'static str) -> ExtractionStrategy {
    ExtractionStrategy {
        name,
        matcher: Matcher::Pattern(regex),
        postprocess: PostProcess::Unescape,
    }
}

/// All strategies, in priority order.
pub static STRATEGIES: &[ExtractionStrategy] = &[
    meta("og:video", r#"meta[property="og:video"]"#),
    meta("og:video:secure_url", r#"meta[property="og:video:secure_url"]"#),
    meta("og:video:url", r#"meta[property="og:video:url"]"#),
    meta("twitter:player:stream", r#"meta[name="twitter:player:stream"]"#),
    pattern("playable_url", r#""playable_url":"([^"]+)""#),
    pattern("playable_url_quality_hd", r#""playable_url_quality_hd":"([^"]+)""#),
    pattern("playable_url_quality_sd", r#""playable_url_quality_sd":"([^"]+)""#),
    pattern("hd_src", r#"hd_src:"([^"]+)""#),
    pattern("sd_src", r#"sd_src:"([^"]+)""#),
    pattern("sd_src_no_ratelimit", r#"sd_src_no_ratelimit:"([^"]+)""#),
    pattern("hd_src_no_ratelimit", r#"hd_src_no_ratelimit:"([^"]+)""#),
    pattern("video_url", r#"video_url:"([^"]+)""#),
    pattern("video_url_escaped", r#"video_url\\":\\"([^\\"]+)\\""#),
    pattern("browser_native_sd_url", r#"browser_native_sd_url":"([^"]+)""#),
    pattern("browser_native_hd_url", r#"browser_native_hd_url":"([^"]+)""#),
];

/// A strategy with its matcher compiled.
pub(crate) enum CompiledMatcher {
    Meta(Selector),
    Pattern(Regex),
}

pub(crate) struct CompiledStrategy {
    pub strategy: &'static ExtractionStrategy,
    pub matcher: CompiledMatcher,
}

/// Compiled once; the strategy table is static so failures here are programming errors.
pub(crate) static COMPILED: LazyLock<Vec<CompiledStrategy>> = LazyLock::new(|| {
    STRATEGIES
        .iter()
        .map(|strategy| {
            let matcher = match strategy.matcher {
                Matcher::MetaContent(selector) => {
                    CompiledMatcher::Meta(Selector::parse(selector).unwrap())
                }
                Matcher::Pattern(regex) => CompiledMatcher::Pattern(Regex::new(regex).unwrap()),
            };
            CompiledStrategy { strategy, matcher }
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_strategies_compile() {
        assert_eq!(COMPILED.len(), STRATEGIES.len());
    }

    #[test]
    fn test_metadata_strategies_come_first() {
        let first_pattern = STRATEGIES
            .iter()
            .position(|s| matches!(s.matcher, Matcher::Pattern(_)))
            .unwrap();
        assert!(STRATEGIES[..first_pattern]
            .iter()
            .all(|s| matches!(s.matcher, Matcher::MetaContent(_))));
        assert!(STRATEGIES[first_pattern..]
            .iter()
            .all(|s| matches!(s.matcher, Matcher::Pattern(_))));
    }

    #[test]
    fn test_strategy_names_unique() {
        let mut names: Vec<_> = STRATEGIES.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), STRATEGIES.len());
    }
}
