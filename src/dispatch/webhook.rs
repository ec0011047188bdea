use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::embeds::Embed;
use super::{MessageId, NotificationSink, OutboundMessage, SinkError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    embeds: &'a [Embed],
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Discord-style webhook: POST with `wait=true` to get the message id back, then
/// PATCH/DELETE `messages/{id}` for edits.
pub struct WebhookSink {
    client: reqwest::Client,
    webhook_url: String,
    username: Option<String>,
    avatar_url: Option<String>,
}

impl WebhookSink {
    pub fn new(
        webhook_url: &str,
        username: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| format!("Failed to build webhook client: {error}"))?;

        Ok(Self {
            client,
            webhook_url: webhook_url.trim_end_matches('/').to_string(),
            username,
            avatar_url,
        })
    }

    fn create_url(&self) -> String {
        format!("{}?wait=true", self.webhook_url)
    }

    fn message_url(&self, message_id: &str) -> String {
        format!("{}/messages/{message_id}", self.webhook_url)
    }

    fn payload<'a>(&'a self, message: &'a OutboundMessage) -> WebhookPayload<'a> {
        WebhookPayload {
            username: self.username.as_deref(),
            avatar_url: self.avatar_url.as_deref(),
            content: message.content.as_deref(),
            embeds: &message.embeds,
        }
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SinkError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SinkError::NotFound);
    }
    if !status.is_success() {
        return Err(SinkError::Status(status.as_u16()));
    }

    Ok(response)
}

fn request_error(error: reqwest::Error) -> SinkError {
    SinkError::Request(error.to_string())
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn create(&self, message: &OutboundMessage) -> Result<MessageId, SinkError> {
        let response = self
            .client
            .post(self.create_url())
            .json(&self.payload(message))
            .send()
            .await
            .map_err(request_error)?;

        let created = check_status(response)?
            .json::<CreatedMessage>()
            .await
            .map_err(request_error)?;

        tracing::debug!(message_id = %created.id, title = message.title(), "Posted webhook message");
        Ok(created.id)
    }

    async fn update(&self, message_id: &str, message: &OutboundMessage) -> Result<(), SinkError> {
        let response = self
            .client
            .patch(self.message_url(message_id))
            .json(&self.payload(message))
            .send()
            .await
            .map_err(request_error)?;

        check_status(response).map(|_| ())
    }

    async fn delete(&self, message_id: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .delete(self.message_url(message_id))
            .send()
            .await
            .map_err(request_error)?;

        check_status(response).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::WebhookSink;
    use crate::dispatch::embeds::raid_idle;
    use crate::dispatch::OutboundMessage;

    fn sink() -> WebhookSink {
        WebhookSink::new(
            "https://discord.com/api/webhooks/1/token/",
            Some("Raid Bot".to_string()),
            None,
        )
        .expect("Failed to build webhook sink")
    }

    #[test]
    fn builds_message_urls() {
        let sink = sink();
        assert_eq!(
            sink.create_url(),
            "https://discord.com/api/webhooks/1/token?wait=true"
        );
        assert_eq!(
            sink.message_url("42"),
            "https://discord.com/api/webhooks/1/token/messages/42"
        );
    }

    #[test]
    fn payload_omits_unset_fields() {
        let sink = sink();
        let message = OutboundMessage::embed(raid_idle()).with_content("@here");
        let payload = serde_json::to_value(sink.payload(&message)).expect("Failed to serialize payload");

        assert_eq!(payload["username"], "Raid Bot");
        assert_eq!(payload["content"], "@here");
        assert!(payload.get("avatar_url").is_none());
        assert_eq!(payload["embeds"].as_array().map(Vec::len), Some(1));
    }
}
