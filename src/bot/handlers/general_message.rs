use teloxide::prelude::*;

use crate::bot::handlers::HandlerResult;
use crate::utils::feedback::CommandFeedback;

/// Anything that is not a known command. Only private chats get an answer,
/// and only for things that look like commands.
pub async fn handle_general_message(bot: Bot, msg: Message) -> HandlerResult {
    if !msg.chat.is_private() {
        return Ok(());
    }

    if let Some(text) = msg.text() {
        if let Some(command) = text.split_whitespace().next().filter(|word| word.starts_with('/')) {
            tracing::debug!("Unknown command {} in chat {}", command, msg.chat.id);
            CommandFeedback::new(bot, msg.chat.id)
                .info(&format!("Unknown command {command}. Use /help to see what I can do."))
                .await?;
        }
    }

    Ok(())
}
