use serde::Serialize;

use crate::error::DeliveryError;

/// Telegram's per-message text limit
pub const MAX_TEXT_LEN: usize = 4096;

/// An outbound chat message. Built fresh for every send and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    chat_id: String,
    text: String,
}

impl Message {
    /// Build a message, rejecting a blank destination, a blank body, or a body
    /// over [`MAX_TEXT_LEN`] characters.
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Result<Self, DeliveryError> {
        let chat_id = chat_id.into();
        let text = text.into();

        if chat_id.trim().is_empty() {
            return Err(DeliveryError::MissingDestination);
        }
        if text.trim().is_empty() {
            return Err(DeliveryError::EmptyText);
        }
        let len = text.chars().count();
        if len > MAX_TEXT_LEN {
            return Err(DeliveryError::TextTooLong(len));
        }

        Ok(Self { chat_id, text })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
