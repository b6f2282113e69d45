//! [`MessagingGateway`] over the Telegram Bot API.

use crate::bot::resilient::{send_document_resilient, send_message_resilient};
use crate::bot::views::options_keyboard;
use anyhow::Result;
use async_trait::async_trait;
use ceknomor_runtime::{MessagingGateway, PromptOption};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::warn;

/// Gateway bound to a single chat.
pub struct TelegramGateway {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramGateway {
    /// Create a gateway for `chat_id`.
    pub const fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn deliver_prompt(&self, text: &str, options: &[PromptOption]) -> Result<()> {
        let keyboard = (!options.is_empty()).then(|| options_keyboard(options));
        send_message_resilient(&self.bot, self.chat_id, text, keyboard).await?;
        Ok(())
    }

    async fn deliver_file(&self, file_name: &str, content: &[u8]) -> Result<()> {
        if let Err(e) = send_document_resilient(&self.bot, self.chat_id, file_name, content).await {
            warn!(file_name = %file_name, error = %e, "Failed to send file");
            return Err(e);
        }
        Ok(())
    }
}
