//! Telegram update handlers.
//!
//! Each handler turns an update into an [`InboundEvent`] and hands it to the
//! shared [`InteractionSession`] together with a gateway bound to the chat.

use crate::bot::gateway::TelegramGateway;
use crate::bot::resilient::clear_keyboard_resilient;
use anyhow::{anyhow, Result};
use ceknomor_runtime::{ConversationId, InboundEvent, InteractionSession, SessionCommand};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Perintah yang tersedia:")]
pub enum Command {
    /// Show usage and reset the session
    #[command(description = "mulai dan tampilkan bantuan.")]
    Start,
    /// Show usage and reset the session
    #[command(description = "tampilkan bantuan.")]
    Help,
    /// Identity check: one pair, several pairs, or none to send a list
    #[command(description = "periksa NIK dan KK: /ceknik <NIK> <KK>.")]
    Ceknik(String),
    /// Identity batch from a spreadsheet URL
    #[command(description = "periksa NIK/KK dari spreadsheet: /urlceknik <URL>.")]
    Urlceknik(String),
    /// SIM status batch inline, or none to send a list
    #[command(description = "periksa status SIM: /nomor <MSISDN...>.")]
    Nomor(String),
    /// SIM status batch from a spreadsheet URL
    #[command(description = "periksa status SIM dari spreadsheet: /urlcekstatus <URL>.")]
    Urlcekstatus(String),
    /// Drop the pending batch
    #[command(description = "batalkan proses yang tertunda.")]
    Batal,
}

impl From<Command> for SessionCommand {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Start => Self::Start,
            Command::Help => Self::Help,
            Command::Ceknik(args) => Self::CheckIdentity(args),
            Command::Urlceknik(args) => Self::IdentityUrl(args),
            Command::Nomor(args) => Self::SimStatus(args),
            Command::Urlcekstatus(args) => Self::SimStatusUrl(args),
            Command::Batal => Self::Cancel,
        }
    }
}

async fn dispatch(
    bot: &Bot,
    chat_id: ChatId,
    event: InboundEvent,
    session: &InteractionSession,
) -> Result<()> {
    let gateway = TelegramGateway::new(bot.clone(), chat_id);
    session
        .handle_event(ConversationId(chat_id.0), event, &gateway)
        .await
}

/// Handle a recognized command.
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    session: Arc<InteractionSession>,
) -> Result<()> {
    info!(chat_id = msg.chat.id.0, command = ?cmd, "Command received");
    dispatch(&bot, msg.chat.id, InboundEvent::Command(cmd.into()), &session).await
}

/// Handle a plain text message.
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn handle_text(bot: Bot, msg: Message, session: Arc<InteractionSession>) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    dispatch(&bot, msg.chat.id, InboundEvent::Text(text.to_string()), &session).await
}

/// Answer a button press so the client stops showing its spinner.
///
/// Returns `false` if Telegram refused the answer. The press is handled
/// either way.
pub async fn acknowledge_callback(bot: &Bot, q: &CallbackQuery) -> bool {
    match bot.answer_callback_query(q.id.clone()).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Failed to answer callback query");
            false
        }
    }
}

/// Handle a press on the format keyboard.
///
/// The keyboard is removed first so the same prompt cannot be answered twice.
///
/// # Errors
///
/// Returns an error if the callback has no message or the reply cannot be
/// delivered.
pub async fn handle_format_callback(
    bot: Bot,
    q: CallbackQuery,
    session: Arc<InteractionSession>,
) -> Result<()> {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };

    acknowledge_callback(&bot, &q).await;

    let message = q
        .message
        .as_ref()
        .ok_or_else(|| anyhow!("Callback message missing chat id"))?;
    let chat_id = message.chat().id;
    clear_keyboard_resilient(&bot, chat_id, message.id()).await;

    dispatch(&bot, chat_id, InboundEvent::ButtonPress(data), &session).await
}
