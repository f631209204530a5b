//! Chrome/Chromium executable discovery.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::RenderError;

/// Termux install prefix.
const TERMUX_PREFIX: &str = "/data/data/com.termux/files/usr";

/// Common Chrome executable paths to check, in order.
const CHROME_PATHS: &[&str] = &[
    // Termux (Android)
    "/data/data/com.termux/files/usr/bin/chromium",
    "/data/data/com.termux/files/usr/bin/chromium-browser",
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Executable names to look up in PATH.
const CHROME_COMMANDS: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Whether we run on a memory-constrained device (Termux or ARM64 Linux).
///
/// Such devices need Chromium's single-process mode to stay stable.
pub fn is_constrained_device() -> bool {
    let termux = std::env::var("PREFIX").is_ok_and(|p| p == TERMUX_PREFIX);
    termux || (cfg!(target_arch = "aarch64") && cfg!(target_os = "linux"))
}

/// Find a Chrome executable.
///
/// An explicit path wins when it exists; otherwise known install paths are
/// checked, then PATH.
pub fn find_chrome(explicit: Option<&Path>) -> Result<PathBuf, RenderError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        warn!(
            "Configured Chrome path does not exist: {}, searching defaults",
            path.display()
        );
    }

    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in CHROME_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(RenderError::Unavailable(
        "Chrome/Chromium not found. Please install it:\n\
         - Termux: pkg install x11-repo && pkg install chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or set CHROME_PATH to the executable"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_existing_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chromium");
        std::fs::write(&fake, b"").unwrap();

        let found = find_chrome(Some(&fake)).unwrap();
        assert_eq!(found, fake);
    }

    #[test]
    fn test_termux_paths_checked_first() {
        assert!(CHROME_PATHS[0].starts_with(TERMUX_PREFIX));
    }
}
