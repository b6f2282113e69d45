//! View layer for bot UI components
//!
//! Keyboards built from the prompt options the session hands over.

use ceknomor_runtime::PromptOption;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Inline keyboard with every option on one row.
///
/// # Examples
///
/// ```
/// use ceknomor_runtime::interaction::format_options;
/// use ceknomor_transport_telegram::bot::views::options_keyboard;
///
/// let keyboard = options_keyboard(&format_options());
/// assert_eq!(keyboard.inline_keyboard[0].len(), 3);
/// ```
#[must_use]
pub fn options_keyboard(options: &[PromptOption]) -> InlineKeyboardMarkup {
    let row = options
        .iter()
        .map(|option| InlineKeyboardButton::callback(option.label.clone(), option.payload.clone()))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}
