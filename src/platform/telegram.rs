use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ReplyParameters, UserId};
use teloxide::update_listeners::Polling;
use tracing::{debug, info};

use crate::platform::{IncomingMessage, ReplySink};
use crate::relay::Relay;

/// Sends replies through the Telegram Bot API
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    async fn send_reply(&self, chat_id: i64, reply_to_message_id: i32, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(reply_to_message_id)))
            .await?;
        Ok(())
    }
}

/// Snapshot a teloxide message, including the message it replies to.
pub fn to_incoming(msg: &Message, bot_id: UserId) -> IncomingMessage {
    let sender = msg.from.as_ref();
    IncomingMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        sender_id: sender.map(|user| user.id.0),
        sender_is_self: sender.is_some_and(|user| user.id == bot_id),
        text: msg.text().or_else(|| msg.caption()).unwrap_or_default().to_string(),
        reply_to: msg
            .reply_to_message()
            .map(|replied| Box::new(to_incoming(replied, bot_id))),
    }
}

/// Run the Telegram update loop until the process is stopped
pub async fn run(
    relay: Arc<Relay>,
    bot: Bot,
    bot_id: UserId,
    poll_timeout: Duration,
) -> Result<()> {
    info!("Listening for messages addressed to {}", relay.mention());

    let handler = Update::filter_message()
        .map(move |msg: Message| to_incoming(&msg, bot_id))
        .endpoint(handle_message);

    let listener = Polling::builder(bot.clone())
        .timeout(poll_timeout)
        .delete_webhook()
        .await
        .build();

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .default_handler(|upd| async move {
            debug!("Ignoring non-message update: {:?}", upd.id);
        })
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("telegram update listener"),
        )
        .await;

    Ok(())
}

async fn handle_message(incoming: IncomingMessage, relay: Arc<Relay>) -> ResponseResult<()> {
    // Messages not addressed to the bot end here. Accepted ones run on their
    // own task so the update loop never waits on them.
    relay.dispatch(incoming);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_message(json: serde_json::Value) -> Message {
        serde_json::from_value(json).unwrap()
    }

    fn user(id: u64, is_bot: bool) -> serde_json::Value {
        serde_json::json!({"id": id, "is_bot": is_bot, "first_name": "someone"})
    }

    fn chat() -> serde_json::Value {
        serde_json::json!({"id": -100, "type": "group", "title": "team"})
    }

    #[test]
    fn test_to_incoming_with_reply_from_bot() {
        let msg = parse_message(serde_json::json!({
            "message_id": 11,
            "date": 1700000000,
            "chat": chat(),
            "from": user(42, false),
            "text": "@lazy_bot de",
            "reply_to_message": {
                "message_id": 10,
                "date": 1699999990,
                "chat": chat(),
                "from": user(7, true),
                "text": "[\"fr\" -> \"en\"]\nHello"
            }
        }));

        let incoming = to_incoming(&msg, UserId(7));
        assert_eq!(incoming.chat_id, -100);
        assert_eq!(incoming.message_id, 11);
        assert_eq!(incoming.sender_id, Some(42));
        assert!(!incoming.sender_is_self);
        assert_eq!(incoming.text, "@lazy_bot de");

        let replied = incoming.reply_to.unwrap();
        assert_eq!(replied.message_id, 10);
        assert!(replied.sender_is_self);
        assert_eq!(replied.text, "[\"fr\" -> \"en\"]\nHello");
    }

    #[test]
    fn test_to_incoming_uses_caption() {
        let msg = parse_message(serde_json::json!({
            "message_id": 12,
            "date": 1700000000,
            "chat": chat(),
            "from": user(42, false),
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 1,
                "height": 1
            }],
            "caption": "Bonjour"
        }));

        let incoming = to_incoming(&msg, UserId(7));
        assert_eq!(incoming.text, "Bonjour");
        assert!(incoming.reply_to.is_none());
    }
}
