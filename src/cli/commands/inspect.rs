//! Offline check of saved page markup.

use std::path::Path;

use anyhow::Context;
use console::style;

use clipfetch::{detect_block, resolve_media, BlockStatus};

use crate::cli::icons::{error, success, warn};

pub async fn cmd_inspect(file: &Path, final_url: &str) -> anyhow::Result<()> {
    let markup = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    println!("{} {} ({} bytes)", style("Page:").bold(), file.display(), markup.len());

    if let BlockStatus::Blocked(reason) = detect_block(final_url, &markup) {
        println!(
            "{} Login wall detected ({})",
            warn(),
            style(reason.as_str()).yellow()
        );
        anyhow::bail!("page is access-restricted");
    }

    match resolve_media(&markup) {
        Some(resolution) => {
            println!(
                "{} {} {}",
                success(),
                style(resolution.strategy).cyan(),
                resolution.media
            );
            Ok(())
        }
        None => {
            println!("{} No media source found", error());
            anyhow::bail!("no media source found")
        }
    }
}
