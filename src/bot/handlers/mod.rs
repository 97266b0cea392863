pub mod callback;
pub mod general_message;
pub mod message;

use chrono::{DateTime, Utc};
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::{ApiError, RequestError};

use crate::bot::commands::{AdminCommand, Command};
use crate::bot::screens::{self, MainMenu, Screen};
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::{TelegramProfile, User};
use crate::services::subscription::SubscriptionService;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

/// Routes commands, admin commands, callback queries and any other
/// message. Handlers expect `DatabaseManager` and `Arc<Config>` among the
/// dispatcher dependencies.
pub fn schema() -> UpdateHandler<HandlerError> {
    let messages = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(message::command_handler),
        )
        .branch(
            dptree::entry()
                .filter_command::<AdminCommand>()
                .endpoint(message::admin_command_handler),
        )
        .branch(dptree::endpoint(general_message::handle_general_message));

    dptree::entry()
        .branch(messages)
        .branch(Update::filter_callback_query().endpoint(callback::callback_handler))
}

pub(crate) fn telegram_id(user: &teloxide::types::User) -> i64 {
    user.id.0 as i64
}

pub(crate) fn profile_of(user: &teloxide::types::User) -> TelegramProfile {
    TelegramProfile {
        telegram_id: telegram_id(user),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        language_code: user.language_code.clone(),
    }
}

pub(crate) async fn send_screen(bot: &Bot, chat_id: ChatId, screen: Screen) -> ResponseResult<Message> {
    let mut request = bot
        .send_message(chat_id, screen.text)
        .parse_mode(ParseMode::MarkdownV2);
    if let Some(keyboard) = screen.keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await
}

/// Replaces the content of a bot message. Re-rendering an unchanged
/// screen is not an error.
pub(crate) async fn edit_screen(bot: &Bot, message: &Message, screen: Screen) -> ResponseResult<()> {
    let mut request = bot
        .edit_message_text(message.chat.id, message.id, screen.text)
        .parse_mode(ParseMode::MarkdownV2);
    if let Some(keyboard) = screen.keyboard {
        request = request.reply_markup(keyboard);
    }

    match request.await {
        Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e),
    }
}

pub(crate) async fn main_menu_screen(
    db: &DatabaseManager,
    config: &Config,
    user: &User,
    now: &DateTime<Utc>,
) -> Result<Screen, sqlx::Error> {
    let status = SubscriptionService::new(db.pool.clone()).status(user.telegram_id, now).await?;
    let channel_link = config.channel_link();
    let user_name = user.display_name();

    Ok(screens::main_menu(&MainMenu {
        lang: user.language(),
        channel_name: &config.channel_name,
        channel_link: channel_link.as_deref(),
        user_name: &user_name,
        status: &status,
        show_admin: config.enable_admin_panel && config.is_admin(user.telegram_id),
    }))
}
