//! The conversation state machine.

use super::event::{ConversationId, InboundEvent, SessionCommand};
use super::gateway::{format_options, MessagingGateway};
use super::messages;
use super::state::{Phase, SessionState};
use crate::session_registry::SessionRegistry;
use anyhow::Result;
use ceknomor_core::batch::{load_rows, BatchProcessor, BatchSource, TableSource};
use ceknomor_core::clients::Verifier;
use ceknomor_core::error::{ExportError, VerifyError};
use ceknomor_core::export::{ExportFormat, ResultExporter};
use ceknomor_core::model::{ResultSet, VerificationKind, VerificationRequest};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Services a session drives.
#[derive(Clone)]
pub struct SessionServices {
    /// NIK + KK lookups
    pub identity: Arc<dyn Verifier>,
    /// MSISDN status lookups
    pub sim_status: Arc<dyn Verifier>,
    /// Remote table fetcher for URL batches
    pub tables: Arc<dyn TableSource>,
}

impl SessionServices {
    fn verifier(&self, kind: VerificationKind) -> &dyn Verifier {
        match kind {
            VerificationKind::Identity => self.identity.as_ref(),
            VerificationKind::SimStatus => self.sim_status.as_ref(),
        }
    }
}

#[derive(Debug, Error)]
enum SessionError {
    /// Bad input or state; reported and the session resets
    #[error(transparent)]
    Verify(#[from] VerifyError),
    /// The report could not be rendered, staged or sent after the batch ran
    #[error(transparent)]
    Report(anyhow::Error),
    /// The gateway could not deliver a reply
    #[error(transparent)]
    Delivery(#[from] anyhow::Error),
}

/// Drives every conversation through collect, choose, run, export, deliver.
pub struct InteractionSession {
    registry: SessionRegistry<ConversationId>,
    services: SessionServices,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl InteractionSession {
    /// Session service with an empty registry.
    #[must_use]
    pub fn new(services: SessionServices) -> Self {
        Self {
            registry: SessionRegistry::new(),
            services,
            clock: local_now,
        }
    }

    /// Replace the clock used to stamp report file names.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Per-conversation state.
    #[must_use]
    pub const fn registry(&self) -> &SessionRegistry<ConversationId> {
        &self.registry
    }

    /// Handle one inbound event to completion.
    ///
    /// Input and state errors are answered in the conversation and never
    /// returned. A conversation that ends up idle is dropped from the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns an error only when the gateway cannot deliver the reply that
    /// reports a failure.
    #[instrument(skip(self, gateway))]
    pub async fn handle_event(
        &self,
        conversation: ConversationId,
        event: InboundEvent,
        gateway: &dyn MessagingGateway,
    ) -> Result<()> {
        let entry = self.registry.get_or_create(conversation).await;
        let result = {
            let mut state = entry.lock().await;
            self.drive(&mut state, event, gateway).await
        };
        drop(entry);
        self.registry.remove_if_idle(&conversation).await;
        result
    }

    async fn drive(
        &self,
        state: &mut SessionState,
        event: InboundEvent,
        gateway: &dyn MessagingGateway,
    ) -> Result<()> {
        let outcome = match event {
            InboundEvent::Command(command) => self.on_command(state, command, gateway).await,
            InboundEvent::Text(text) => self.on_text(state, &text, gateway).await,
            InboundEvent::ButtonPress(payload) => {
                self.on_format_choice(state, &payload, gateway).await
            }
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(SessionError::Verify(e)) => {
                warn!(error = %e, category = ?e.category(), "Session error, resetting");
                state.reset();
                gateway.deliver_message(&messages::session_error(&e)).await
            }
            Err(SessionError::Report(e)) => {
                error!(error = %e, "Report delivery failed, batch kept");
                state.retry_export();
                gateway
                    .deliver_prompt(&messages::export_failed(&e), &format_options())
                    .await
            }
            Err(SessionError::Delivery(e)) => {
                error!(error = %e, "Reply delivery failed");
                if state.phase() == Phase::Exporting {
                    state.retry_export();
                }
                Err(e)
            }
        }
    }

    async fn on_command(
        &self,
        state: &mut SessionState,
        command: SessionCommand,
        gateway: &dyn MessagingGateway,
    ) -> Result<(), SessionError> {
        info!(command = ?command, "Command received");
        match command {
            SessionCommand::Start | SessionCommand::Help => {
                state.reset();
                gateway.deliver_message(messages::USAGE).await?;
            }
            SessionCommand::Cancel => {
                let had_work = state.phase() != Phase::Idle || state.pending().is_some();
                state.reset();
                let reply = if had_work {
                    messages::CANCELLED
                } else {
                    messages::NOTHING_TO_CANCEL
                };
                gateway.deliver_message(reply).await?;
            }
            SessionCommand::CheckIdentity(args) => {
                self.on_identity_command(state, &args, gateway).await?;
            }
            SessionCommand::SimStatus(args) => {
                let numbers: Vec<&str> = args.split_whitespace().collect();
                if numbers.is_empty() {
                    self.ask_for_text(state, VerificationKind::SimStatus, gateway)
                        .await?;
                } else {
                    let source = BatchSource::text(&numbers.join("\n"))?;
                    store_batch(state, VerificationKind::SimStatus, source, gateway).await?;
                }
            }
            SessionCommand::IdentityUrl(args) => {
                let source = BatchSource::url(&args)?;
                store_batch(state, VerificationKind::Identity, source, gateway).await?;
            }
            SessionCommand::SimStatusUrl(args) => {
                let source = BatchSource::url(&args)?;
                store_batch(state, VerificationKind::SimStatus, source, gateway).await?;
            }
        }
        Ok(())
    }

    /// `/ceknik`: none → prompt for text, one → usage, two → single lookup,
    /// more → batch of pairs.
    async fn on_identity_command(
        &self,
        state: &mut SessionState,
        args: &str,
        gateway: &dyn MessagingGateway,
    ) -> Result<(), SessionError> {
        let keys: Vec<&str> = args.split_whitespace().collect();
        match keys.as_slice() {
            [] => {
                self.ask_for_text(state, VerificationKind::Identity, gateway)
                    .await
            }
            [_] => Err(VerifyError::user_input(messages::CEKNIK_USAGE).into()),
            [nik, kk] => {
                let request = VerificationRequest::identity(*nik, *kk);
                let result = self.services.identity.verify(&request).await;
                gateway
                    .deliver_message(&messages::identity_reply(&result))
                    .await?;
                Ok(())
            }
            _ => {
                let lines: Vec<String> = keys.chunks(2).map(|pair| pair.join(" ")).collect();
                let source = BatchSource::text(&lines.join("\n"))?;
                store_batch(state, VerificationKind::Identity, source, gateway).await
            }
        }
    }

    async fn ask_for_text(
        &self,
        state: &mut SessionState,
        kind: VerificationKind,
        gateway: &dyn MessagingGateway,
    ) -> Result<(), SessionError> {
        state.await_text(kind);
        gateway
            .deliver_message(messages::ask_for_text(kind))
            .await?;
        Ok(())
    }

    async fn on_text(
        &self,
        state: &mut SessionState,
        text: &str,
        gateway: &dyn MessagingGateway,
    ) -> Result<(), SessionError> {
        match state.phase() {
            Phase::AwaitingText(kind) => {
                let source = BatchSource::text(text)?;
                store_batch(state, kind, source, gateway).await
            }
            _ => {
                gateway.deliver_message(messages::UNRECOGNIZED).await?;
                Ok(())
            }
        }
    }

    async fn on_format_choice(
        &self,
        state: &mut SessionState,
        payload: &str,
        gateway: &dyn MessagingGateway,
    ) -> Result<(), SessionError> {
        if state.pending().is_none() {
            return Err(VerifyError::NoPendingBatch.into());
        }
        let Ok(format) = payload.parse::<ExportFormat>() else {
            warn!(payload, "Unknown format choice, asking again");
            gateway
                .deliver_prompt(messages::UNKNOWN_FORMAT, &format_options())
                .await?;
            return Ok(());
        };
        info!(format = %format, "Format chosen");

        state.begin_export();
        gateway.deliver_message(messages::PROCESSING).await?;

        let results = self.results_for_pending(state).await?;
        self.deliver_report(&results, format, gateway).await?;

        state.reset();
        gateway.deliver_message(messages::DONE).await?;
        Ok(())
    }

    /// Run the pending batch, or reuse the results of an earlier run.
    async fn results_for_pending(&self, state: &mut SessionState) -> Result<ResultSet, VerifyError> {
        let pending = state.pending_mut().ok_or(VerifyError::NoPendingBatch)?;
        if let Some(results) = &pending.results {
            info!(rows = results.len(), "Reusing results of the pending batch");
            return Ok(results.clone());
        }

        let rows = load_rows(pending.kind, &pending.source, self.services.tables.as_ref()).await?;
        let results = BatchProcessor::run(&rows, self.services.verifier(pending.kind)).await;
        pending.results = Some(results.clone());
        Ok(results)
    }

    async fn deliver_report(
        &self,
        results: &ResultSet,
        format: ExportFormat,
        gateway: &dyn MessagingGateway,
    ) -> Result<(), SessionError> {
        let report = |e: ExportError| SessionError::Report(e.into());
        let artifact = ResultExporter::export(results, format, (self.clock)()).map_err(report)?;
        // Removed from disk when `staged` drops, delivered or not
        let staged = artifact.stage().map_err(report)?;
        let content = staged.read().await.map_err(report)?;
        gateway
            .deliver_file(staged.file_name(), &content)
            .await
            .map_err(SessionError::Report)?;
        info!(
            file = %staged.file_name(),
            rows = artifact.row_count,
            "Report delivered"
        );
        Ok(())
    }
}

async fn store_batch(
    state: &mut SessionState,
    kind: VerificationKind,
    source: BatchSource,
    gateway: &dyn MessagingGateway,
) -> Result<(), SessionError> {
    let replaced = state.store_pending(kind, source);
    info!(kind = %kind, replaced, "Batch pending");
    if replaced {
        gateway.deliver_message(messages::BATCH_REPLACED).await?;
    }
    gateway
        .deliver_prompt(messages::CHOOSE_FORMAT, &format_options())
        .await?;
    Ok(())
}
