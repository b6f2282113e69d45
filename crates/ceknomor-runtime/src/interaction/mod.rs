//! Conversation handling.
//!
//! A conversation moves through `Idle → AwaitingFormatChoice → Exporting →
//! Idle`, with an optional `AwaitingText` detour when a batch is typed in a
//! follow-up message instead of passed as command arguments.

mod event;
mod gateway;
pub mod messages;
mod session;
mod state;

pub use event::{ConversationId, InboundEvent, SessionCommand};
pub use gateway::{format_options, MessagingGateway, PromptOption};
pub use session::{InteractionSession, SessionServices};
pub use state::{PendingBatch, Phase, SessionState};
