//! Telegram MarkdownV2 helpers.
//!
//! Every message the bot sends uses MarkdownV2, so any text that is not
//! deliberate markup has to go through [`escape_markdown`] first.

const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes every MarkdownV2 reserved character with a backslash.
///
/// ```
/// use pnp_subscription_bot::utils::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("$14.99 (7 days)"), "$14\\.99 \\(7 days\\)");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Bold span around escaped text.
pub fn bold(text: &str) -> String {
    format!("*{}*", escape_markdown(text))
}

/// Inline code span. Inside code only `` ` `` and `\` need escaping.
pub fn code(text: &str) -> String {
    format!("`{}`", text.replace('\\', "\\\\").replace('`', "\\`"))
}
