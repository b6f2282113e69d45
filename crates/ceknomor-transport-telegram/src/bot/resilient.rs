//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Sends are retried on transient failures using exponential backoff with
//! jitter. Only delivery goes through here; verification calls never retry.

use anyhow::Result;
use ceknomor_core::utils::{retry_transport_operation, truncate_str};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, InputFile, Message, MessageId};
use tracing::{debug, warn};

/// Telegram rejects longer texts.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Send a message with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = truncate_str(text.into(), MAX_MESSAGE_CHARS);
    retry_transport_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(markup) = keyboard.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Upload a document from memory with automatic retry.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_document_resilient(
    bot: &Bot,
    chat_id: ChatId,
    file_name: &str,
    content: &[u8],
) -> Result<Message> {
    retry_transport_operation(|| async {
        let file = InputFile::memory(content.to_vec()).file_name(file_name.to_string());
        bot.send_document(chat_id, file)
            .await
            .map_err(|e| anyhow::anyhow!("Telegram upload error: {e}"))
    })
    .await
}

/// Remove the inline keyboard from a message, with graceful degradation.
///
/// Returns `false` if the keyboard could not be removed; callers carry on.
pub async fn clear_keyboard_resilient(bot: &Bot, chat_id: ChatId, msg_id: MessageId) -> bool {
    const ERROR_NOT_MODIFIED: &str = "message is not modified";

    let result = retry_transport_operation(|| async {
        match bot.edit_message_reply_markup(chat_id, msg_id).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains(ERROR_NOT_MODIFIED) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
        }
    })
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            let err_msg = e.to_string();
            if err_msg.contains("message to edit not found") {
                debug!("Keyboard removal skipped: {err_msg}");
            } else {
                warn!("Failed to remove keyboard after retries: {e}");
            }
            false
        }
    }
}
