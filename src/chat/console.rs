//! Line-oriented transport for running the bot from a terminal.
//!
//! Input lines are `sender<TAB>text`; a line without a tab comes from
//! `console`. Replies are printed, media is copied into an outbox directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use console::style;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{ChatTransport, HandleOutcome, InboundMessage, MessageHandler, TransportError};

const DEFAULT_SENDER: &str = "console";

/// Parse one input line. Blank lines yield nothing.
pub fn parse_line(line: &str, seq: u64) -> Option<InboundMessage> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (sender, text) = match line.split_once('\t') {
        Some((sender, text)) if !sender.trim().is_empty() => (sender.trim(), text),
        Some((_, text)) => (DEFAULT_SENDER, text),
        None => (DEFAULT_SENDER, line),
    };

    if text.trim().is_empty() {
        return None;
    }

    Some(InboundMessage::direct(
        sender,
        format!("console-{}", seq),
        text.trim(),
    ))
}

/// Prints replies and drops media into `outbox`.
pub struct ConsoleTransport {
    outbox: PathBuf,
}

impl ConsoleTransport {
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self {
            outbox: outbox.into(),
        }
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_text(
        &self,
        chat: &str,
        text: &str,
        quoted: Option<&str>,
    ) -> Result<(), TransportError> {
        let quote = quoted.map(|id| format!(" re {}", id)).unwrap_or_default();
        println!(
            "{} {}",
            style(format!("[{}{}]", chat, quote)).cyan(),
            text
        );
        Ok(())
    }

    async fn send_media(
        &self,
        chat: &str,
        path: &Path,
        caption: &str,
        quoted: Option<&str>,
    ) -> Result<(), TransportError> {
        let name = path
            .file_name()
            .ok_or_else(|| TransportError::Rejected(format!("not a file: {}", path.display())))?;

        tokio::fs::create_dir_all(&self.outbox).await?;
        let target = self.outbox.join(name);
        tokio::fs::copy(path, &target).await?;

        let quote = quoted.map(|id| format!(" re {}", id)).unwrap_or_default();
        println!(
            "{} {} {}",
            style(format!("[{}{}]", chat, quote)).cyan(),
            style(target.display()).green(),
            caption
        );
        Ok(())
    }
}

/// Feed every line from `input` to `handler`, one task per message.
///
/// Returns once input ends and all in-flight messages are finished.
pub async fn run_console<R>(handler: Arc<MessageHandler>, input: R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut tasks = JoinSet::new();
    let mut seq: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(msg) = parse_line(&line, seq) else {
            continue;
        };
        seq += 1;

        let handler = Arc::clone(&handler);
        tasks.spawn(async move {
            let outcome = handler.handle(&msg).await;
            debug!(id = %msg.id, ?outcome, "Message handled");
            outcome
        });

        // Reap finished tasks so the set does not grow unbounded
        while let Some(done) = tasks.try_join_next() {
            log_join(done);
        }
    }

    let handled = seq as usize;
    while let Some(done) = tasks.join_next().await {
        log_join(done);
    }
    Ok(handled)
}

fn log_join(result: Result<HandleOutcome, tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!("Message task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_with_sender() {
        let msg = parse_line("alice\tlook https://fb.watch/x/\n", 3).unwrap();
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.chat, "alice");
        assert_eq!(msg.id, "console-3");
        assert_eq!(msg.text, "look https://fb.watch/x/");
    }

    #[test]
    fn test_parse_line_without_sender() {
        let msg = parse_line("hello there", 0).unwrap();
        assert_eq!(msg.sender, DEFAULT_SENDER);
        assert_eq!(msg.text, "hello there");
    }

    #[test]
    fn test_parse_line_blank() {
        assert!(parse_line("   ", 0).is_none());
        assert!(parse_line("bob\t  ", 0).is_none());
    }

    #[tokio::test]
    async fn test_send_media_copies_into_outbox() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("fb_video_1.mp4");
        std::fs::write(&src, b"video").unwrap();

        let transport = ConsoleTransport::new(dir.path().join("outbox"));
        transport
            .send_media("alice", &src, "caption", Some("m1"))
            .await
            .unwrap();

        let copied = transport.outbox().join("fb_video_1.mp4");
        assert_eq!(std::fs::read(copied).unwrap(), b"video");
    }
}
