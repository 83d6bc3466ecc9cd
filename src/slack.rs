//! Slack delivery through the Web API (`chat.postMessage`).
//!
//! Slack answers HTTP 200 even for rejected messages, so a delivery only
//! counts as successful when the response body carries `"ok": true`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::SlackConfig;
use crate::errors::WebhookError;
use crate::traits::WebhookSink;

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct SlackClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
    channel: String,
}

impl SlackClient {
    pub fn new(token: String, channel: String, config: &SlackConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            token,
            channel,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/chat.postMessage",
            self.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl WebhookSink for SlackClient {
    fn target(&self) -> &str {
        &self.channel
    }

    async fn post(&self, text: &str) -> Result<(), WebhookError> {
        let body = serde_json::json!({
            "channel": self.channel,
            "text": text,
            "mrkdwn": true,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status.as_u16()));
        }

        let reply: PostMessageResponse = resp.json().await?;
        if !reply.ok {
            return Err(WebhookError::Rejected(
                reply.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        debug!(channel = %self.channel, "message posted to Slack");
        Ok(())
    }
}
