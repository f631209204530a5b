//! Share-link extraction from free-form message text.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Domains whose links we know how to resolve.
pub const SHARE_DOMAINS: &[&str] = &["facebook.com", "fb.watch", "fb.com", "fb.me"];

static SHARE_DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(facebook\.com|fb\.watch|fb\.com|fb\.me)").unwrap());

// Scheme-prefixed links, or bare links starting at a share domain (with optional subdomains).
// A bare domain must end at a path or a word boundary, so `facebook.community` is not a link.
static URL_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(https?://\S+|(?:[a-z0-9-]+\.)*(?:facebook\.com|fb\.watch|fb\.com|fb\.me)(?:/\S*|\b))",
    )
    .unwrap()
});

/// Check whether text mentions any share domain at all.
pub fn mentions_share_domain(text: &str) -> bool {
    SHARE_DOMAIN.is_match(text)
}

/// Find the share link in a message, if any.
///
/// Returns `None` when the text carries no share-domain token or no URL-shaped
/// run. Bare links get `https://` prepended.
pub fn find_share_link(text: &str) -> Option<Url> {
    if !mentions_share_domain(text) {
        return None;
    }

    let raw = URL_SHAPED.find(text)?.as_str();
    normalize_candidate(raw)
}

/// Normalize a URL-shaped string into an absolute URL.
pub fn normalize_candidate(raw: &str) -> Option<Url> {
    let cleaned = trim_trailing_punctuation(raw.trim());
    if cleaned.is_empty() {
        return None;
    }

    let lower = cleaned.to_ascii_lowercase();
    let absolute = if lower.starts_with("http://") || lower.starts_with("https://") {
        cleaned.to_string()
    } else {
        format!("https://{}", cleaned)
    };

    let url = Url::parse(&absolute).ok()?;
    url.host_str()?;
    Some(url)
}

/// Strip sentence punctuation that trails a link, keeping balanced brackets.
fn trim_trailing_punctuation(url: &str) -> &str {
    let mut end = url.len();
    while end > 0 {
        let current = &url[..end];
        let should_pop = match current.chars().last() {
            Some(')') => current.matches('(').count() < current.matches(')').count(),
            Some(']') => current.matches('[').count() < current.matches(']').count(),
            Some('.') | Some(',') | Some('!') | Some('?') | Some(';') => true,
            _ => false,
        };
        if !should_pop {
            break;
        }
        end -= 1;
    }
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_has_no_candidate() {
        assert!(find_share_link("hello there").is_none());
        assert!(find_share_link("check https://example.com/video").is_none());
    }

    #[test]
    fn test_scheme_prefixed_link() {
        let url = find_share_link("look https://www.facebook.com/share/v/abc123/ lol").unwrap();
        assert_eq!(url.as_str(), "https://www.facebook.com/share/v/abc123/");
    }

    #[test]
    fn test_bare_link_gets_https() {
        let url = find_share_link("fb.watch/xYz_09").unwrap();
        assert_eq!(url.as_str(), "https://fb.watch/xYz_09");

        let url = find_share_link("see www.facebook.com/reel/42").unwrap();
        assert_eq!(url.as_str(), "https://www.facebook.com/reel/42");
    }

    #[test]
    fn test_domain_matching_is_case_insensitive() {
        let url = find_share_link("HTTPS://FB.WATCH/Abc").unwrap();
        assert_eq!(url.host_str(), Some("fb.watch"));
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        let url = find_share_link("watch this: https://fb.watch/abc.").unwrap();
        assert_eq!(url.as_str(), "https://fb.watch/abc");

        let url = find_share_link("(https://fb.watch/abc)").unwrap();
        assert_eq!(url.as_str(), "https://fb.watch/abc");
    }

    #[test]
    fn test_first_url_shaped_run_wins() {
        let url = find_share_link("https://fb.watch/first https://fb.watch/second").unwrap();
        assert_eq!(url.as_str(), "https://fb.watch/first");
    }

    #[test]
    fn test_domain_without_link_shape() {
        // Mentions the domain inside a word that is not a link start.
        assert!(find_share_link("i love myfacebook.community").is_none());
    }

    #[test]
    fn test_domain_prefix_of_longer_host_is_not_a_link() {
        assert!(find_share_link("see facebook.community").is_none());
        assert!(find_share_link("fb.meetup is tonight").is_none());
    }

    #[test]
    fn test_bare_domain_followed_by_punctuation() {
        let url = find_share_link("it's on fb.watch, go look").unwrap();
        assert_eq!(url.as_str(), "https://fb.watch/");
    }

    #[test]
    fn test_normalize_rejects_hostless() {
        assert!(normalize_candidate("https://").is_none());
        assert!(normalize_candidate("").is_none());
    }
}
