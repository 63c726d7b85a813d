pub mod telegram;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::message::Message;

/// Anything that can deliver a [`Message`] to a chat platform.
///
/// One call is one delivery attempt; implementations never retry.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), DeliveryError>;
}
