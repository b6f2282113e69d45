use crate::bot::handlers::{self, Command};
use crate::config::BotSettings;
use ceknomor_core::batch::HttpTableSource;
use ceknomor_core::clients::identity::IdentityLookupClient;
use ceknomor_core::clients::sim_status::SimStatusClient;
use ceknomor_runtime::{InteractionSession, SessionServices};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let session = Arc::new(init_session(&settings));

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![session, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_session(settings: &BotSettings) -> InteractionSession {
    let sim_status = match SimStatusClient::from_settings(settings.verifier.as_ref()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize SIM status client: {}", e);
            std::process::exit(1);
        }
    };
    let identity = IdentityLookupClient::from_settings(settings.verifier.as_ref());
    info!(
        identity = %settings.verifier.identity_check_url,
        sim_status = %settings.verifier.sim_status_url,
        "Verification clients initialized."
    );

    InteractionSession::new(SessionServices {
        identity: Arc::new(identity),
        sim_status: Arc::new(sim_status),
        tables: Arc::new(HttpTableSource::new()),
    })
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    session: Arc<InteractionSession>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_command(bot, msg, cmd, session).await {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    session: Arc<InteractionSession>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_text(bot, msg, session).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    session: Arc<InteractionSession>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_format_callback(bot, q, session).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
