pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// A message received from the chat platform, detached from the platform types.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i32,
    /// Absent for messages without a user sender (e.g. channel posts)
    pub sender_id: Option<u64>,
    /// True when the bot itself authored this message
    pub sender_is_self: bool,
    pub text: String,
    pub reply_to: Option<Box<IncomingMessage>>,
}

/// Outbound side of the platform: threads a reply under an existing message.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_reply(&self, chat_id: i64, reply_to_message_id: i32, text: &str) -> Result<()>;
}
