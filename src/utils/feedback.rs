use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::utils::markdown::{bold, code, escape_markdown};

/// Outcome markers for replies to commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
}

impl FeedbackType {
    pub fn emoji(&self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
        }
    }

    /// Escaped MarkdownV2 body with the outcome emoji in front.
    pub fn format(&self, message: &str) -> String {
        format!("{} {}", self.emoji(), escape_markdown(message))
    }
}

/// Builds the usage block sent when a command is called with bad arguments.
pub fn usage_text(command: &str, description: &str, examples: &[&str]) -> String {
    let mut text = format!("{}\n\n{}\n", bold(command), escape_markdown(description));
    if !examples.is_empty() {
        text.push('\n');
        for example in examples {
            text.push_str(&format!("• {}\n", code(example)));
        }
    }
    text
}

/// Reply helper bound to one chat.
pub struct CommandFeedback {
    bot: Bot,
    chat_id: ChatId,
}

impl CommandFeedback {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    pub async fn send(&self, feedback_type: FeedbackType, message: &str) -> ResponseResult<Message> {
        self.bot
            .send_message(self.chat_id, feedback_type.format(message))
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    pub async fn success(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Success, message).await
    }

    pub async fn error(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Error, message).await
    }

    pub async fn warning(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Warning, message).await
    }

    pub async fn info(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Info, message).await
    }

    pub async fn usage(&self, command: &str, description: &str, examples: &[&str]) -> ResponseResult<Message> {
        self.bot
            .send_message(self.chat_id, usage_text(command, description, examples))
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_format_escapes_body() {
        assert_eq!(
            FeedbackType::Error.format("Unknown plan: 2-week."),
            "❌ Unknown plan: 2\\-week\\."
        );
        assert_eq!(FeedbackType::Success.format("ok"), "✅ ok");
    }

    #[test]
    fn test_usage_text_lists_examples_as_code() {
        let text = usage_text(
            "/grant",
            "Grant access manually.",
            &["/grant 123456789 month", "/grant 123456789 week 14"],
        );
        assert!(text.starts_with("*/grant*\n\nGrant access manually\\.\n"));
        assert!(text.contains("• `/grant 123456789 month`\n"));
        assert!(text.contains("• `/grant 123456789 week 14`\n"));
    }
}
