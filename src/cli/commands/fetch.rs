//! One-shot download of a share link.

use std::path::PathBuf;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use clipfetch::config::Settings;
use clipfetch::extract::normalize_candidate;
use clipfetch::http_client::FetchEvent;
use clipfetch::{Pipeline, ResolutionRequest};

use crate::cli::icons::{dim_arrow, error, success};

pub async fn cmd_fetch(
    settings: &Settings,
    url: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let source =
        normalize_candidate(url).with_context(|| format!("Not a usable URL: {}", url))?;

    // Download to a fresh file; --output is only written on success.
    let request = match output.as_deref() {
        Some(path) => {
            if path.exists() {
                anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
            }
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            ResolutionRequest::in_dir(source, &dir)
        }
        None => {
            settings.ensure_directories()?;
            ResolutionRequest::in_dir(source, &settings.temp_dir)
        }
    };

    let pipeline = Pipeline::from_settings(settings)?;

    eprintln!(
        "{} Fetching {} (budget {}s)",
        dim_arrow(),
        style(&request.source_url).cyan(),
        pipeline.budget().as_secs()
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Rendering page...");
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    let (tx, rx) = mpsc::channel(64);
    let progress = tokio::spawn(show_progress(pb.clone(), rx));

    let result = pipeline.resolve_and_fetch(&request, Some(&tx)).await;
    drop(tx);
    let _ = progress.await;
    pb.finish_and_clear();

    match result {
        Ok(fetched) => {
            let strategy = fetched.strategy;
            let bytes = fetched.bytes;
            let path = match output {
                Some(ref dest) => fetched
                    .persist_to(dest)
                    .await
                    .with_context(|| format!("Failed to save {}", dest.display()))?,
                None => fetched.keep(),
            };
            eprintln!(
                "{} Saved {} ({} bytes, matched by {})",
                success(),
                style(path.display()).green(),
                bytes,
                strategy
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {} [{}]", error(), e, style(e.kind()).yellow());
            anyhow::bail!("fetch failed: {}", e.kind())
        }
    }
}

async fn show_progress(pb: ProgressBar, mut rx: mpsc::Receiver<FetchEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            FetchEvent::Started { total_bytes, .. } => {
                if let Some(total) = total_bytes {
                    pb.set_length(total);
                    if let Ok(bar) = ProgressStyle::default_bar().template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                    ) {
                        pb.set_style(bar.progress_chars("#>-"));
                    }
                }
                pb.set_message("Downloading...");
            }
            FetchEvent::Progress { downloaded, .. } => {
                pb.set_position(downloaded);
            }
            FetchEvent::Completed { .. } => {
                pb.set_message("Done");
            }
        }
    }
}
