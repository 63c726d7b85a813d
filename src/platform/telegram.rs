use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::TelegramConfig;
use crate::error::DeliveryError;
use crate::message::Message;
use crate::platform::MessageSender;

/// Envelope every Bot API response is wrapped in
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Stateless client for the Bot API `sendMessage` method
pub struct TelegramClient {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Destination used when the caller has no other chat in mind
    pub fn default_chat_id(&self) -> &str {
        &self.config.chat_id
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base, self.config.bot_token
        )
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, message: &Message) -> Result<(), DeliveryError> {
        debug!(
            "Sending Telegram message to chat {} ({} chars)",
            message.chat_id(),
            message.text().chars().count()
        );

        let response = self
            .client
            .post(self.send_message_url())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Telegram API HTTP error (status={}): {}", status, body);
            return Err(DeliveryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Telegram API returned non-JSON response: {}", body);
            DeliveryError::InvalidResponse(e)
        })?;

        if !parsed.ok {
            let description = parsed.description.unwrap_or_default();
            error!(
                "Telegram API error (code={:?}): {}",
                parsed.error_code, description
            );
            return Err(DeliveryError::Api {
                code: parsed.error_code,
                description,
            });
        }

        info!("Telegram message sent to chat {}", message.chat_id());
        Ok(())
    }
}
