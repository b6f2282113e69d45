#![deny(missing_docs)]
//! Ceknomor runtime.
//!
//! Transport-agnostic conversation handling: the collect, choose-format,
//! run, export and deliver cycle behind a messaging gateway trait.

/// Conversation state machine and its gateway contract.
pub mod interaction;
/// Per-conversation state registry.
pub mod session_registry;

pub use interaction::{
    ConversationId, InboundEvent, InteractionSession, MessagingGateway, Phase, PromptOption,
    SessionCommand, SessionServices, SessionState,
};
pub use session_registry::SessionRegistry;
