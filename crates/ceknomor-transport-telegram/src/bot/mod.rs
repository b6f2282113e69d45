/// Messaging gateway bound to one Telegram chat
pub mod gateway;
/// Command, text and callback handlers
pub mod handlers;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// View layer for UI components (keyboards)
pub mod views;

pub use gateway::TelegramGateway;
