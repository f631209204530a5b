//! Browser engine configuration types.
//!
//! These types live here (always compiled) rather than behind
//! `#[cfg(feature = "browser")]` so that config parsing and serialization
//! work without the browser feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default upper bound on page navigation, in seconds.
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 90;

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Set to false for debugging or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Navigation timeout in seconds, covering redirects and network quiescence.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Explicit Chrome/Chromium executable. Auto-discovered when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Additional Chrome arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chrome_args: Vec<String>,

    /// User agent override. Uses a current desktop Chrome string when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Inject stealth evasion scripts before navigation.
    #[serde(default = "default_stealth")]
    pub stealth: bool,
}

fn default_headless() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_NAVIGATION_TIMEOUT_SECS
}

fn default_stealth() -> bool {
    true
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout: default_timeout(),
            proxy: None,
            chrome_path: None,
            chrome_args: Vec::new(),
            user_agent: None,
            stealth: default_stealth(),
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `CHROME_PATH` - Chrome/Chromium executable
    /// - `SOCKS_PROXY` - SOCKS proxy for browser traffic (e.g., "socks5://127.0.0.1:9050")
    /// - `CLIPFETCH_NAVIGATION_TIMEOUT` - Navigation timeout in seconds
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = non_empty_env("CHROME_PATH") {
            self.chrome_path = Some(PathBuf::from(path));
        }
        if let Some(proxy) = non_empty_env("SOCKS_PROXY") {
            self.proxy = Some(proxy);
        }
        if let Some(secs) = non_empty_env("CLIPFETCH_NAVIGATION_TIMEOUT") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout = secs,
                _ => tracing::warn!(
                    "Ignoring invalid CLIPFETCH_NAVIGATION_TIMEOUT value: {}",
                    secs
                ),
            }
        }
        self
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
