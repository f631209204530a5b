//! Console chat loop.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::BufReader;

use clipfetch::chat::{run_console, AllowList, ConsoleTransport, MessageHandler};
use clipfetch::config::Settings;
use clipfetch::Pipeline;

use crate::cli::icons::{dim_arrow, warn};

pub async fn cmd_listen(settings: &Settings, outbox: Option<PathBuf>) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let outbox = outbox.unwrap_or_else(|| settings.temp_dir.join("outbox"));
    let authorizer = AllowList::new(settings.authorized_senders.iter().cloned());
    if authorizer.is_open() {
        eprintln!(
            "{} No authorized_senders configured, accepting messages from anyone",
            warn()
        );
    }

    let pipeline = Pipeline::from_settings(settings)?;
    let handler = Arc::new(MessageHandler::new(
        pipeline,
        Arc::new(ConsoleTransport::new(&outbox)),
        Arc::new(authorizer),
        settings.messages.clone(),
        &settings.temp_dir,
    ));

    eprintln!("{} Reading messages from stdin (sender<TAB>text)", dim_arrow());
    eprintln!("{} Delivering videos to {}", dim_arrow(), outbox.display());

    let handled = run_console(handler, BufReader::new(tokio::io::stdin())).await?;
    tracing::info!("Input closed after {} messages", handled);
    Ok(())
}
