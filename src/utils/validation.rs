use anyhow::{anyhow, Result};
use url::Url;

/// Longest grant accepted from an admin, in days (about a century).
pub const MAX_GRANT_DAYS: i64 = 36_500;

pub fn validate_user_id(user_id: i64) -> Result<()> {
    if user_id <= 0 {
        return Err(anyhow!("User ID must be a positive number"));
    }

    // Telegram user ids fit in 52 bits
    if user_id > (1_i64 << 52) {
        return Err(anyhow!("User ID is out of Telegram's range"));
    }

    Ok(())
}

pub fn validate_grant_days(days: i64) -> Result<()> {
    if days < 1 {
        return Err(anyhow!("Days must be at least 1"));
    }

    if days > MAX_GRANT_DAYS {
        return Err(anyhow!("Days cannot be more than {}", MAX_GRANT_DAYS));
    }

    Ok(())
}

/// Accepts `@username` channels (5-32 chars of letters, digits and
/// underscores) and numeric chat ids such as `-1001234567890`.
pub fn validate_channel_id(channel_id: &str) -> Result<()> {
    let channel_id = channel_id.trim();

    if channel_id.is_empty() {
        return Err(anyhow!("Channel ID cannot be empty"));
    }

    if let Some(name) = channel_id.strip_prefix('@') {
        if name.len() < 5 || name.len() > 32 {
            return Err(anyhow!("Channel username must be 5-32 characters long"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!("Channel username can only contain letters, numbers, and underscores"));
        }
        return Ok(());
    }

    match channel_id.parse::<i64>() {
        Ok(id) if id < 0 => Ok(()),
        Ok(_) => Err(anyhow!("Numeric channel IDs are negative")),
        Err(_) => Err(anyhow!("Channel ID must be an @username or a numeric chat ID")),
    }
}

/// Payment links end up in URL buttons, which Telegram only accepts for
/// absolute http(s) URLs.
pub fn validate_payment_link(link: &str) -> Result<Url> {
    let url = Url::parse(link.trim()).map_err(|e| anyhow!("Invalid payment link: {}", e))?;

    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(anyhow!("Payment link must use http or https, not {}", other)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id(123456789).is_ok());
        assert!(validate_user_id(7_000_000_000).is_ok());

        assert!(validate_user_id(0).is_err());
        assert!(validate_user_id(-5).is_err());
        assert!(validate_user_id(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_grant_days_bounds() {
        assert!(validate_grant_days(1).is_ok());
        assert!(validate_grant_days(9999).is_ok());
        assert!(validate_grant_days(MAX_GRANT_DAYS).is_ok());

        assert!(validate_grant_days(0).is_err());
        assert!(validate_grant_days(-30).is_err());
        assert!(validate_grant_days(MAX_GRANT_DAYS + 1).is_err());
    }

    #[test]
    fn test_validate_channel_id_usernames() {
        assert!(validate_channel_id("@your_private_channel").is_ok());
        assert!(validate_channel_id("@pnptv").is_ok());

        assert!(validate_channel_id("@abc").is_err());
        assert!(validate_channel_id("@has space").is_err());
        assert!(validate_channel_id("@dash-ed-name").is_err());
        assert!(validate_channel_id("").is_err());
    }

    #[test]
    fn test_validate_channel_id_numeric() {
        assert!(validate_channel_id("-1001234567890").is_ok());
        assert!(validate_channel_id("12345").is_err());
        assert!(validate_channel_id("channel").is_err());
    }

    #[test]
    fn test_validate_payment_link() {
        let url = validate_payment_link("https://checkout.bold.co/payment/LNK_WEEK").unwrap();
        assert_eq!(url.host_str(), Some("checkout.bold.co"));

        assert!(validate_payment_link("  https://pay.example.com/x  ").is_ok());
        assert!(validate_payment_link("ftp://pay.example.com").is_err());
        assert!(validate_payment_link("not a url").is_err());
        assert!(validate_payment_link("").is_err());
    }
}
