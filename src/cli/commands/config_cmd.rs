//! Configuration display.

use console::style;

use clipfetch::config::{Config, Settings};

use crate::cli::icons::dim_arrow;

/// Print the loaded config as TOML, followed by the resolved paths.
pub fn cmd_config_show(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults (no config file found)".to_string());

    eprintln!("{} Source: {}", dim_arrow(), source);
    eprintln!(
        "{} Temp dir: {}",
        dim_arrow(),
        style(settings.temp_dir.display()).cyan()
    );
    eprintln!(
        "{} Pipeline timeout: {}s, navigation timeout: {}s",
        dim_arrow(),
        settings.pipeline_timeout.as_secs(),
        settings.browser.timeout
    );

    let mut effective = config.clone();
    effective.temp_dir = Some(settings.temp_dir.display().to_string());
    effective.pipeline_timeout = Some(settings.pipeline_timeout.as_secs());
    effective.browser = settings.browser.clone();

    println!("{}", effective.to_toml()?);
    Ok(())
}
