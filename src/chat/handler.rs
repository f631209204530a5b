//! Per-message flow: authorize, extract, acknowledge, fetch, deliver.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{Authorizer, ChatTransport, InboundMessage};
use crate::config::Messages;
use crate::extract::{find_share_link, mentions_share_domain};
use crate::pipeline::{FailureKind, Pipeline, ResolutionRequest};

/// Characters of message text shown in logs.
const LOG_PREVIEW_CHARS: usize = 100;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Sender not on the allow-list; nothing was sent.
    Unauthorized,
    /// No share link in the text; nothing was sent.
    NoLink,
    /// Video delivered to the chat.
    Delivered { strategy: &'static str, bytes: u64 },
    /// Pipeline failed; the user got a failure reply.
    Failed(FailureKind),
    /// Video fetched but the transport refused it; the user got a failure reply.
    DeliveryFailed,
}

/// Handles inbound chat messages against one pipeline.
pub struct MessageHandler {
    pipeline: Pipeline,
    transport: Arc<dyn ChatTransport>,
    authorizer: Arc<dyn Authorizer>,
    messages: Messages,
    temp_dir: PathBuf,
}

impl MessageHandler {
    pub fn new(
        pipeline: Pipeline,
        transport: Arc<dyn ChatTransport>,
        authorizer: Arc<dyn Authorizer>,
        messages: Messages,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pipeline,
            transport,
            authorizer,
            messages,
            temp_dir: temp_dir.into(),
        }
    }

    /// Process one message. Every failure is reported to the user exactly once.
    pub async fn handle(&self, msg: &InboundMessage) -> HandleOutcome {
        let preview: String = msg.text.chars().take(LOG_PREVIEW_CHARS).collect();
        debug!(sender = %msg.sender, "Incoming message: {}", preview);

        if !self.authorizer.is_authorized(&msg.sender) {
            debug!(sender = %msg.sender, "Ignoring message from unauthorized sender");
            return HandleOutcome::Unauthorized;
        }

        if !mentions_share_domain(&msg.text) {
            return HandleOutcome::NoLink;
        }
        let Some(url) = find_share_link(&msg.text) else {
            debug!("Share domain mentioned but no link could be extracted");
            return HandleOutcome::NoLink;
        };

        info!(sender = %msg.sender, url = %url, "Processing share link");
        let request = ResolutionRequest::in_dir(url, &self.temp_dir);

        self.reply(msg, &self.messages.fetching).await;

        let fetched = match self.pipeline.resolve_and_fetch(&request, None).await {
            Ok(fetched) => fetched,
            Err(e) => {
                let kind = e.kind();
                self.reply(msg, kind.user_message(&self.messages)).await;
                return HandleOutcome::Failed(kind);
            }
        };

        let sent = self
            .transport
            .send_media(
                &msg.chat,
                fetched.path(),
                &self.messages.caption,
                Some(&msg.id),
            )
            .await;

        let strategy = fetched.strategy;
        let bytes = fetched.bytes;
        fetched.discard().await;

        match sent {
            Ok(()) => {
                info!(sender = %msg.sender, bytes, "Video delivered");
                HandleOutcome::Delivered { strategy, bytes }
            }
            Err(e) => {
                error!("Failed to deliver video: {}", e);
                self.reply(msg, &self.messages.failure).await;
                HandleOutcome::DeliveryFailed
            }
        }
    }

    async fn reply(&self, msg: &InboundMessage, text: &str) {
        if let Err(e) = self.transport.send_text(&msg.chat, text, Some(&msg.id)).await {
            warn!("Failed to send reply to {}: {}", msg.chat, e);
        }
    }
}
