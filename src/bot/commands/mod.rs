use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "PNP Television bot commands:")]
pub enum Command {
    #[command(description = "Open the main menu")]
    Start,
    #[command(description = "Show help and support contact")]
    Help,
    #[command(description = "List the available passes")]
    Plans,
    #[command(description = "Show your subscription")]
    Status,
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Admin commands:")]
pub enum AdminCommand {
    #[command(description = "Grant access: /grant <user_id> <plan> [days]")]
    Grant(String),
    #[command(description = "Show subscription statistics")]
    Stats,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_commands() {
        assert_eq!(Command::parse("/start", "pnp_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/plans@pnp_bot", "pnp_bot").unwrap(), Command::Plans);
        assert!(Command::parse("/grant 1 month", "pnp_bot").is_err());
    }

    #[test]
    fn test_parse_admin_commands() {
        assert_eq!(
            AdminCommand::parse("/grant 123456 month 10", "pnp_bot").unwrap(),
            AdminCommand::Grant("123456 month 10".to_string())
        );
        assert_eq!(AdminCommand::parse("/grant", "pnp_bot").unwrap(), AdminCommand::Grant(String::new()));
        assert_eq!(AdminCommand::parse("/stats", "pnp_bot").unwrap(), AdminCommand::Stats);
    }
}
