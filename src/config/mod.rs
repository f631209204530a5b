//! Configuration management for clipfetch using the prefer crate.

mod browser;
mod loader;

pub use browser::{BrowserEngineConfig, DEFAULT_NAVIGATION_TIMEOUT_SECS};
pub use loader::{load_settings, LoadOptions};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use browser::non_empty_env;

/// Default total budget for one pipeline run, in seconds.
pub const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 120;

/// Default directory for in-flight downloads.
pub const DEFAULT_TEMP_DIR: &str = "temp_videos";

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("Failed to create directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Texts sent back to chat users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Messages {
    /// Acknowledgement sent once a link was found.
    pub fetching: String,
    /// Caption attached to the delivered video.
    pub caption: String,
    /// Reply when the video could not be retrieved.
    pub failure: String,
    /// Reply when the video sits behind a login wall.
    pub restricted: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            fetching: "⏳ Hang on! I'm fetching that video for you...".to_string(),
            caption: "Here is your Facebook video! 🎬".to_string(),
            failure: "❌ Oops! I couldn't download that video. It might be private or the link might be broken.".to_string(),
            restricted: "🔒 That video is behind a login wall, so I can't fetch it. Only public videos work.".to_string(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory for in-flight downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
    /// Total budget for one pipeline run, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_timeout: Option<u64>,
    /// Browser engine settings.
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    /// Senders allowed to trigger downloads. Empty allows everyone.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorized_senders: Vec<String>,
    /// Reply texts.
    #[serde(default)]
    pub messages: Messages,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    /// Falls back to defaults when no file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load("clipfetch").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_or_default(path).await,
                None => Self::default(),
            },
            Err(_) => {
                tracing::debug!("No clipfetch config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`, logging and falling back to defaults on error.
    pub async fn load_or_default(path: &Path) -> Self {
        match Self::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Format follows the extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_err("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_err("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_err("JSON", e.to_string())),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// `~` is expanded; relative paths are joined onto `base_dir`.
    pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Serialize to TOML for display.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory for in-flight downloads.
    pub temp_dir: PathBuf,
    /// Total budget for one pipeline run.
    pub pipeline_timeout: Duration,
    pub browser: BrowserEngineConfig,
    pub authorized_senders: Vec<String>,
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            pipeline_timeout: Duration::from_secs(DEFAULT_PIPELINE_TIMEOUT_SECS),
            browser: BrowserEngineConfig::default(),
            authorized_senders: Vec::new(),
            messages: Messages::default(),
        }
    }
}

impl Settings {
    /// Build settings from a config, resolving relative paths against `base_dir`.
    pub fn from_config(config: &Config, base_dir: &Path) -> Self {
        let temp_dir = config
            .temp_dir
            .as_deref()
            .unwrap_or(DEFAULT_TEMP_DIR);

        Self {
            temp_dir: Config::resolve_path(temp_dir, base_dir),
            pipeline_timeout: Duration::from_secs(
                config
                    .pipeline_timeout
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_PIPELINE_TIMEOUT_SECS),
            ),
            browser: config.browser.clone(),
            authorized_senders: config.authorized_senders.clone(),
            messages: config.messages.clone(),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// - `CLIPFETCH_TEMP_DIR` - download directory
    /// - `CLIPFETCH_PIPELINE_TIMEOUT` - pipeline budget in seconds
    /// - plus the browser overrides in [`BrowserEngineConfig::with_env_overrides`]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = non_empty_env("CLIPFETCH_TEMP_DIR") {
            self.temp_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(secs) = non_empty_env("CLIPFETCH_PIPELINE_TIMEOUT") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => self.pipeline_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "Ignoring invalid CLIPFETCH_PIPELINE_TIMEOUT value: {}",
                    secs
                ),
            }
        }
        self.browser = self.browser.with_env_overrides();
        self
    }

    /// Ensure the download directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.temp_dir).map_err(|source| ConfigError::Directory {
            path: self.temp_dir.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let config = Config::parse(
            Path::new("clipfetch.toml"),
            r#"
            temp_dir = "videos"
            pipeline_timeout = 60
            authorized_senders = ["alice"]

            [browser]
            headless = false

            [messages]
            caption = "enjoy"
            "#,
        )
        .unwrap();

        assert_eq!(config.temp_dir.as_deref(), Some("videos"));
        assert_eq!(config.pipeline_timeout, Some(60));
        assert!(!config.browser.headless);
        assert_eq!(config.browser.timeout, DEFAULT_NAVIGATION_TIMEOUT_SECS);
        assert_eq!(config.authorized_senders, vec!["alice"]);
        assert_eq!(config.messages.caption, "enjoy");
        assert_eq!(config.messages.fetching, Messages::default().fetching);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = Config::parse(Path::new("c.yml"), "pipeline_timeout: 30\n").unwrap();
        assert_eq!(yaml.pipeline_timeout, Some(30));

        let json = Config::parse(Path::new("c.json"), r#"{"temp_dir": "/tmp/v"}"#).unwrap();
        assert_eq!(json.temp_dir.as_deref(), Some("/tmp/v"));
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = Config::parse(Path::new("c.toml"), "temp_dir = [").unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_settings_resolve_relative_temp_dir() {
        let config = Config {
            temp_dir: Some("videos".to_string()),
            ..Default::default()
        };
        let settings = Settings::from_config(&config, Path::new("/srv/bot"));
        assert_eq!(settings.temp_dir, PathBuf::from("/srv/bot/videos"));
        assert_eq!(settings.pipeline_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_settings_zero_timeout_uses_default() {
        let config = Config {
            pipeline_timeout: Some(0),
            ..Default::default()
        };
        let settings = Settings::from_config(&config, Path::new("."));
        assert_eq!(
            settings.pipeline_timeout,
            Duration::from_secs(DEFAULT_PIPELINE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_ensure_directories_creates_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            temp_dir: dir.path().join("a/b"),
            ..Default::default()
        };
        settings.ensure_directories().unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }

    #[test]
    fn test_to_toml_skips_source_path() {
        let config = Config {
            source_path: Some(PathBuf::from("/x/clipfetch.toml")),
            ..Default::default()
        };
        let out = config.to_toml().unwrap();
        assert!(!out.contains("source_path"));
        assert!(out.contains("[browser]"));
    }
}
