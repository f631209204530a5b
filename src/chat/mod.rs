//! Chat-side plumbing: inbound messages, the outbound transport seam and
//! sender authorization.

mod console;
mod handler;

pub use console::{parse_line, run_console, ConsoleTransport};
pub use handler::{HandleOutcome, MessageHandler};

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// A message received from the chat network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Conversation replies go to.
    pub chat: String,
    /// Identity checked against the allow-list.
    pub sender: String,
    /// Message id, used to quote the original in replies.
    pub id: String,
    pub text: String,
}

impl InboundMessage {
    /// Direct message where the conversation is the sender.
    pub fn direct(sender: impl Into<String>, id: impl Into<String>, text: impl Into<String>) -> Self {
        let sender = sender.into();
        Self {
            chat: sender.clone(),
            sender,
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Outbound side of a chat network.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message, optionally quoting an earlier message.
    async fn send_text(
        &self,
        chat: &str,
        text: &str,
        quoted: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Send a media file with a caption, optionally quoting an earlier message.
    async fn send_media(
        &self,
        chat: &str,
        path: &Path,
        caption: &str,
        quoted: Option<&str>,
    ) -> Result<(), TransportError>;
}

/// Decides who may trigger downloads.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, sender: &str) -> bool;
}

/// Static allow-list of sender ids. An empty list admits everyone.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    senders: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            senders: senders.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.senders.is_empty()
    }
}

impl Authorizer for AllowList {
    fn is_authorized(&self, sender: &str) -> bool {
        self.is_open() || self.senders.contains(sender)
    }
}
