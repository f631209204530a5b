//! Client identity sent to the share site and the media CDN.

/// Desktop Chrome user agent used for page rendering and media download.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Accept-Language header value matching the user agent's locale.
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Resolve user agent from config value.
/// - None or blank => default desktop Chrome user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => BROWSER_USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_agent_default() {
        let ua = resolve_user_agent(None);
        assert!(ua.contains("Chrome/"));
        assert_eq!(resolve_user_agent(Some("  ")), BROWSER_USER_AGENT);
    }

    #[test]
    fn test_resolve_user_agent_custom() {
        let ua = resolve_user_agent(Some("MyBot/1.0"));
        assert_eq!(ua, "MyBot/1.0");
    }
}
