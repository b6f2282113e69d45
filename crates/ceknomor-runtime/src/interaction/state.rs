//! Per-conversation state.

use ceknomor_core::batch::BatchSource;
use ceknomor_core::model::{ResultSet, VerificationKind};

/// Where a conversation is in the collect / choose / export cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing pending
    #[default]
    Idle,
    /// The next plain text message is a batch of this kind
    AwaitingText(VerificationKind),
    /// A batch is pending and the format prompt is shown
    AwaitingFormatChoice,
    /// The batch is running or its report is being delivered
    Exporting,
}

/// Batch waiting for a format choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    /// Service the batch targets
    pub kind: VerificationKind,
    /// Raw input, resolved into rows only when a format is chosen
    pub source: BatchSource,
    /// Results of an earlier run of this same input
    pub results: Option<ResultSet>,
}

/// State of one conversation.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    phase: Phase,
    pending: Option<PendingBatch>,
}

impl SessionState {
    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Pending batch, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingBatch> {
        self.pending.as_ref()
    }

    /// `Idle` with nothing pending; such state carries no information.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle) && self.pending.is_none()
    }

    pub(crate) fn pending_mut(&mut self) -> Option<&mut PendingBatch> {
        self.pending.as_mut()
    }

    /// Back to `Idle` with nothing pending.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.pending = None;
    }

    /// Wait for a typed batch of `kind`. Any pending batch is dropped.
    pub fn await_text(&mut self, kind: VerificationKind) {
        self.pending = None;
        self.phase = Phase::AwaitingText(kind);
    }

    /// Store a new batch and wait for a format choice.
    ///
    /// The newest batch wins: returns `true` if an earlier pending batch
    /// (and any results cached for it) was discarded.
    pub fn store_pending(&mut self, kind: VerificationKind, source: BatchSource) -> bool {
        let replaced = self.pending.is_some();
        self.pending = Some(PendingBatch {
            kind,
            source,
            results: None,
        });
        self.phase = Phase::AwaitingFormatChoice;
        replaced
    }

    pub(crate) fn begin_export(&mut self) {
        self.phase = Phase::Exporting;
    }

    /// After a failed export the batch stays pending so another format can
    /// be chosen without running it again.
    pub(crate) fn retry_export(&mut self) {
        if self.pending.is_some() {
            self.phase = Phase::AwaitingFormatChoice;
        } else {
            self.phase = Phase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> BatchSource {
        BatchSource::Text(text.to_string())
    }

    #[test]
    fn test_store_replaces_pending_batch() {
        let mut state = SessionState::default();
        assert!(!state.store_pending(VerificationKind::SimStatus, source("0811")));
        if let Some(pending) = state.pending_mut() {
            pending.results = Some(ResultSet::new(VerificationKind::SimStatus, Vec::new()));
        }

        assert!(state.store_pending(VerificationKind::Identity, source("1 2")));
        let pending = state.pending().expect("batch pending");
        assert_eq!(pending.kind, VerificationKind::Identity);
        assert!(pending.results.is_none());
        assert_eq!(state.phase(), Phase::AwaitingFormatChoice);
    }

    #[test]
    fn test_await_text_drops_pending() {
        let mut state = SessionState::default();
        state.store_pending(VerificationKind::SimStatus, source("0811"));
        state.await_text(VerificationKind::Identity);
        assert!(state.pending().is_none());
        assert_eq!(state.phase(), Phase::AwaitingText(VerificationKind::Identity));
    }

    #[test]
    fn test_retry_export_keeps_batch() {
        let mut state = SessionState::default();
        state.store_pending(VerificationKind::SimStatus, source("0811"));
        state.begin_export();
        assert_eq!(state.phase(), Phase::Exporting);
        state.retry_export();
        assert_eq!(state.phase(), Phase::AwaitingFormatChoice);

        state.reset();
        state.retry_export();
        assert_eq!(state.phase(), Phase::Idle);
    }
}
