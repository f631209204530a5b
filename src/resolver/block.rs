//! Login-wall detection.

use url::Url;

/// Markup signatures of the login form shown instead of content.
const LOGIN_FORM_MARKERS: &[&str] = &[r#"id="login_form""#];

/// Markup signatures of the inline login button overlay.
const LOGIN_BUTTON_MARKERS: &[&str] = &["login_button_inline"];

/// Final URL fragment of every login-related page on the share site.
const LOGIN_URL_PREFIX: &str = "facebook.com/login";

/// Why a page was considered blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    LoginForm,
    LoginButton,
    LoginRedirect,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::LoginForm => "login_form",
            BlockReason::LoginButton => "login_button",
            BlockReason::LoginRedirect => "login_redirect",
        }
    }
}

/// Result of block detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Open,
    Blocked(BlockReason),
}

impl BlockStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, BlockStatus::Blocked(_))
    }
}

/// Inspect a rendered page for an authentication wall.
pub fn detect_block(final_url: &str, markup: &str) -> BlockStatus {
    if LOGIN_FORM_MARKERS.iter().any(|m| markup.contains(m)) {
        return BlockStatus::Blocked(BlockReason::LoginForm);
    }
    if LOGIN_BUTTON_MARKERS.iter().any(|m| markup.contains(m)) {
        return BlockStatus::Blocked(BlockReason::LoginButton);
    }
    if is_login_redirect(final_url) {
        return BlockStatus::Blocked(BlockReason::LoginRedirect);
    }
    BlockStatus::Open
}

/// Whether the final URL landed on a login page.
///
/// Any URL under `facebook.com/login` counts (`/loginhelp`, `/login_alerts`),
/// as does a `login` or `login.php` path segment on any host.
fn is_login_redirect(final_url: &str) -> bool {
    if final_url
        .to_ascii_lowercase()
        .contains(LOGIN_URL_PREFIX)
    {
        return true;
    }

    let Ok(url) = Url::parse(final_url) else {
        return false;
    };

    url.path_segments()
        .map(|mut segments| {
            segments.any(|s| {
                let s = s.to_ascii_lowercase();
                s == "login" || s == "login.php"
            })
        })
        .unwrap_or(false)
}
