//! Outbound side of a conversation.

use anyhow::Result;
use async_trait::async_trait;
use ceknomor_core::export::ExportFormat;

/// One choice offered alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOption {
    /// Text shown to the user
    pub label: String,
    /// Value sent back as [`crate::InboundEvent::ButtonPress`]
    pub payload: String,
}

impl PromptOption {
    /// Build an option.
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// The CSV / TXT / Excel choice.
#[must_use]
pub fn format_options() -> Vec<PromptOption> {
    ExportFormat::ALL
        .into_iter()
        .map(|format| PromptOption::new(format.label(), format.code()))
        .collect()
}

/// Delivery channel bound to a single conversation.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send `text`, optionally with choices the user can press.
    async fn deliver_prompt(&self, text: &str, options: &[PromptOption]) -> Result<()>;

    /// Send a file.
    async fn deliver_file(&self, file_name: &str, content: &[u8]) -> Result<()>;

    /// Send plain text.
    async fn deliver_message(&self, text: &str) -> Result<()> {
        self.deliver_prompt(text, &[]).await
    }
}
