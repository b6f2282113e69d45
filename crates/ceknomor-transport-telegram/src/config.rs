//! Telegram transport settings.

use ceknomor_core::config::VerifierSettings;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    #[serde(alias = "telegram_bot_token")]
    pub telegram_token: String,
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Endpoints and timeouts of the verification services.
    pub verifier: Arc<VerifierSettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(verifier: VerifierSettings, telegram: TelegramSettings) -> Self {
        Self {
            verifier: Arc::new(verifier),
            telegram: Arc::new(telegram),
        }
    }
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// Accepts `TELEGRAM_TOKEN` or `TELEGRAM_BOT_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or no token is set.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = ceknomor_core::config::build_config()?.try_deserialize()?;
        if settings.telegram_token.trim().is_empty() {
            return Err(ConfigError::NotFound("telegram_token".to_string()));
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_token_from_either_variable() -> Result<(), ConfigError> {
        env::remove_var("TELEGRAM_TOKEN");
        env::set_var("TELEGRAM_BOT_TOKEN", "123456789:legacy");
        assert_eq!(TelegramSettings::new()?.telegram_token, "123456789:legacy");
        env::remove_var("TELEGRAM_BOT_TOKEN");

        env::set_var("TELEGRAM_TOKEN", "123456789:primary");
        assert_eq!(TelegramSettings::new()?.telegram_token, "123456789:primary");
        env::remove_var("TELEGRAM_TOKEN");

        assert!(TelegramSettings::new().is_err());
        Ok(())
    }
}
