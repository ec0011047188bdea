pub mod debounce;
pub mod embeds;
pub mod message_ids;
pub mod notifier;
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use self::embeds::Embed;

pub type MessageId = String;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

impl OutboundMessage {
    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn title(&self) -> &str {
        self.embeds
            .first()
            .map(|embed| embed.title.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The remote message is gone; callers treat it as deleted.
    #[error("remote message not found")]
    NotFound,
    #[error("unexpected response status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

/// Create/update/delete of remote messages. Callers never retry; failures are logged.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create(&self, message: &OutboundMessage) -> Result<MessageId, SinkError>;

    async fn update(&self, message_id: &str, message: &OutboundMessage) -> Result<(), SinkError>;

    async fn delete(&self, message_id: &str) -> Result<(), SinkError>;
}

/// Stands in for the webhook when none is configured.
#[derive(Debug, Default)]
pub struct LoggingSink {
    next_message_id: AtomicU64,
}

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn create(&self, message: &OutboundMessage) -> Result<MessageId, SinkError> {
        let message_id = format!(
            "dry-run-{}",
            self.next_message_id.fetch_add(1, Ordering::Relaxed) + 1
        );
        tracing::info!(message_id = %message_id, title = message.title(), "Would post message");
        Ok(message_id)
    }

    async fn update(&self, message_id: &str, message: &OutboundMessage) -> Result<(), SinkError> {
        tracing::info!(message_id, title = message.title(), "Would update message");
        Ok(())
    }

    async fn delete(&self, message_id: &str) -> Result<(), SinkError> {
        tracing::info!(message_id, "Would delete message");
        Ok(())
    }
}
