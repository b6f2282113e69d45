//! Inbound events, as handed over by a transport.

use std::fmt;

/// Identifies one conversation (a chat, for Telegram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commands understood by the session. Arguments are the raw text after the
/// command word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Greeting and usage; resets the session
    Start,
    /// Usage; resets the session
    Help,
    /// Drop any pending batch
    Cancel,
    /// Single identity check, inline identity batch, or prompt for one
    CheckIdentity(String),
    /// Identity batch from a remote table
    IdentityUrl(String),
    /// SIM status batch inline, or prompt for one
    SimStatus(String),
    /// SIM status batch from a remote table
    SimStatusUrl(String),
}

/// Everything a conversation can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A recognized command
    Command(SessionCommand),
    /// Plain text message
    Text(String),
    /// Payload of a pressed prompt option
    ButtonPress(String),
}
