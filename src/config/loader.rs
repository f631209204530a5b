//! Configuration loading logic.

use std::path::PathBuf;

use super::{Config, Settings};

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load config from the file named on the command line, or discover one.
async fn load_file_config(options: &LoadOptions) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_or_default(config_path).await;
    }

    // Priority 2: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;

    let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd()
    } else {
        config.base_dir().unwrap_or_else(cwd)
    };

    let settings = Settings::from_config(&config, &base_dir).with_env_overrides();
    tracing::debug!(
        temp_dir = %settings.temp_dir.display(),
        pipeline_timeout = settings.pipeline_timeout.as_secs(),
        "Settings resolved"
    );

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_config_resolves_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipfetch.toml");
        std::fs::write(&path, "temp_dir = \"downloads\"\npipeline_timeout = 45\n").unwrap();

        let (settings, config) = load_settings(LoadOptions {
            config_path: Some(path.clone()),
            use_cwd: false,
        })
        .await;

        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(settings.temp_dir, dir.path().join("downloads"));
    }

    #[tokio::test]
    async fn test_invalid_explicit_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipfetch.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (_, config) = load_settings(LoadOptions {
            config_path: Some(path),
            use_cwd: true,
        })
        .await;

        assert!(config.source_path.is_none());
        assert!(config.temp_dir.is_none());
    }
}
