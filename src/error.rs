use thiserror::Error;

use crate::message::MAX_TEXT_LEN;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// A single outbound send that did not reach the chat platform.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("message text is empty")]
    EmptyText,
    #[error("message text is {0} characters; the limit is {max}", max = MAX_TEXT_LEN)]
    TextTooLong(usize),
    #[error("destination chat id is not set")]
    MissingDestination,
    #[error("Telegram API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Telegram API rejected the message (code {code:?}): {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },
    #[error("request to Telegram API failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Telegram API returned a malformed response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the bot token
        DeliveryError::Network(err.without_url())
    }
}
