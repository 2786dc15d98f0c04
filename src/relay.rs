use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::compose::compose;
use crate::platform::{IncomingMessage, ReplySink};
use crate::resolver::Resolver;
use crate::translate::{TranslateError, Translator};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unable to translate the message: {0}")]
    Translate(#[from] TranslateError),

    #[error("unable to send the message: {0:#}")]
    Send(anyhow::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// How a single accepted message ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    /// Nothing to translate: no text and no replied-to message
    NoActionableText,
}

/// Read-only settings shared by every dispatched message.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub mention: String,
    pub allowed_user_ids: HashSet<u64>,
    pub deadline: Duration,
}

/// Runs the resolve → translate → compose → send pipeline for accepted messages.
pub struct Relay {
    settings: RelaySettings,
    resolver: Resolver,
    translator: Arc<dyn Translator>,
    sink: Arc<dyn ReplySink>,
}

impl Relay {
    pub fn new(
        settings: RelaySettings,
        resolver: Resolver,
        translator: Arc<dyn Translator>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            settings,
            resolver,
            translator,
            sink,
        }
    }

    pub fn mention(&self) -> &str {
        &self.settings.mention
    }

    /// Only messages that start with the bot's mention and come from a
    /// whitelisted sender are handled. Everything else is dropped silently.
    pub fn accepts(&self, message: &IncomingMessage) -> bool {
        let addressed = message
            .text
            .split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case(&self.settings.mention));
        if !addressed {
            return false;
        }

        match message.sender_id {
            Some(id) if self.settings.allowed_user_ids.contains(&id) => true,
            sender => {
                debug!("Ignoring message from non-whitelisted sender {:?}", sender);
                false
            }
        }
    }

    /// Spawn the pipeline for an accepted message. Anything the filter
    /// rejects is dropped here without spawning a task.
    pub fn dispatch(
        self: &Arc<Self>,
        message: IncomingMessage,
    ) -> Option<JoinHandle<Result<Outcome, RelayError>>> {
        if !self.accepts(&message) {
            return None;
        }
        Some(self.spawn(message))
    }

    /// Handle one accepted message on its own task, bounded by the deadline.
    /// Hitting the deadline drops the pipeline, aborting any in-flight call.
    /// The task logs how the message ended and also returns it.
    fn spawn(
        self: &Arc<Self>,
        message: IncomingMessage,
    ) -> JoinHandle<Result<Outcome, RelayError>> {
        let relay = Arc::clone(self);
        let deadline = self.settings.deadline;
        let span = info_span!(
            "relay",
            request_id = %Uuid::new_v4(),
            chat_id = message.chat_id,
            message_id = message.message_id,
        );

        tokio::spawn(
            async move {
                let result = match tokio::time::timeout(deadline, relay.process(&message)).await {
                    Ok(result) => result,
                    Err(_) => Err(RelayError::Timeout(deadline)),
                };
                match &result {
                    Ok(Outcome::Sent) => debug!("Reply sent"),
                    Ok(Outcome::NoActionableText) => debug!("Nothing to translate, ignoring"),
                    Err(e @ RelayError::Timeout(_)) => warn!("Failed to relay message: {}", e),
                    Err(e) => error!("Failed to relay message: {}", e),
                }
                result
            }
            .instrument(span),
        )
    }

    pub async fn process(&self, message: &IncomingMessage) -> Result<Outcome, RelayError> {
        let request = match self.resolver.request(message) {
            Some(request) => request,
            None => return Ok(Outcome::NoActionableText),
        };
        info!("[{}] {}", request.target_language, request.source_text);

        let result = self
            .translator
            .translate(&request.target_language, &request.source_text)
            .await?;
        debug!("Translation: {}", result.translated_text);

        let reply = compose(
            &result.detected_source_language,
            &request.target_language,
            &result.translated_text,
            request.preceding_tag.as_deref(),
        );

        self.sink
            .send_reply(message.chat_id, message.message_id, &reply)
            .await
            .map_err(RelayError::Send)?;

        Ok(Outcome::Sent)
    }
}
