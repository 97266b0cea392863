/// Callback-data protocol for inline buttons
pub mod callbacks;
/// Slash commands
pub mod commands;
/// Update routing and handlers
pub mod handlers;
/// Screens: message text plus inline keyboard
pub mod screens;

use teloxide::types::{ChatId, Recipient};

/// Support account linked from the help screen.
pub const SUPPORT_URL: &str = "https://t.me/soporte_pnptv";

/// Turns the configured channel into a Bot API recipient: numeric ids
/// address the chat directly, anything else is treated as `@username`.
pub fn channel_recipient(channel_id: &str) -> Recipient {
    let channel_id = channel_id.trim();
    match channel_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if channel_id.starts_with('@') => Recipient::ChannelUsername(channel_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{channel_id}")),
    }
}
