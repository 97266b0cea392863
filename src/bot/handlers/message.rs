use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use teloxide::prelude::*;

use crate::bot::commands::{AdminCommand, Command};
use crate::bot::handlers::{main_menu_screen, profile_of, send_screen, telegram_id, HandlerResult};
use crate::bot::screens::{self, Screen};
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::analytics::START_COMMAND;
use crate::database::models::{AnalyticsEvent, User, UserSetting};
use crate::i18n::{Language, Text};
use crate::plans::Plan;
use crate::services::subscription::{parse_grant_args, SubscriptionService};
use crate::utils::datetime::format_date;
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::{log_command_error, log_command_start, log_command_success, log_database_error};

const GRANT_USAGE: &str = "/grant <user_id> <plan> [days]";
const GRANT_EXAMPLES: [&str; 2] = ["/grant 123456789 month", "/grant 123456789 week 14"];

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let user_id = telegram_id(from);
    let command_name = format!("/{:?}", cmd).to_lowercase();
    log_command_start(&command_name, user_id, None);

    let now = Utc::now();
    let user = match User::upsert_from_telegram(&db.pool, &profile_of(from), &now).await {
        Ok(user) => user,
        Err(e) => {
            log_database_error("upsert", "users", &e.to_string());
            let lang = Language::from_code(from.language_code.as_deref());
            send_screen(&bot, msg.chat.id, Screen::text_only(Text::InternalError.get(lang))).await?;
            return Ok(());
        }
    };

    if user.is_banned {
        send_screen(&bot, msg.chat.id, Screen::text_only(Text::Blocked.get(user.language()))).await?;
        return Ok(());
    }

    let lang = user.language();
    let result = match cmd {
        Command::Start => handle_start(&bot, &msg, &db, &config, &user, &now).await,
        Command::Help => send_screen(&bot, msg.chat.id, screens::help(lang))
            .await
            .map(|_| ())
            .map_err(Into::into),
        Command::Plans => send_screen(&bot, msg.chat.id, screens::plans(lang))
            .await
            .map(|_| ())
            .map_err(Into::into),
        Command::Status => handle_status(&bot, &msg, &db, &user, &now).await,
    };

    match result {
        Ok(()) => log_command_success(&command_name, user_id, None),
        Err(e) => {
            log_command_error(&command_name, user_id, &e.to_string());
            send_screen(&bot, msg.chat.id, Screen::text_only(Text::InternalError.get(lang))).await?;
        }
    }
    Ok(())
}

async fn handle_start(
    bot: &Bot,
    msg: &Message,
    db: &DatabaseManager,
    config: &Config,
    user: &User,
    now: &DateTime<Utc>,
) -> HandlerResult {
    let data = json!({ "username": user.username, "language": user.language_code });
    if let Err(e) = AnalyticsEvent::record(
        &db.pool,
        config.enable_analytics,
        Some(user.telegram_id),
        START_COMMAND,
        Some(&data),
        now,
    )
    .await
    {
        log_database_error("insert", "analytics_events", &e.to_string());
    }

    User::touch_activity(&db.pool, user.telegram_id, now).await?;

    let screen = if UserSetting::onboarding_complete(&db.pool, user.telegram_id).await? {
        main_menu_screen(db, config, user, now).await?
    } else {
        screens::language_selection()
    };
    send_screen(bot, msg.chat.id, screen).await?;
    Ok(())
}

async fn handle_status(
    bot: &Bot,
    msg: &Message,
    db: &DatabaseManager,
    user: &User,
    now: &DateTime<Utc>,
) -> HandlerResult {
    let status = SubscriptionService::new(db.pool.clone())
        .status(user.telegram_id, now)
        .await?;
    send_screen(bot, msg.chat.id, screens::status(user.language(), &status)).await?;
    Ok(())
}

pub async fn admin_command_handler(
    bot: Bot,
    msg: Message,
    cmd: AdminCommand,
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let admin_id = telegram_id(from);
    let command_name = match cmd {
        AdminCommand::Grant(_) => "/grant",
        AdminCommand::Stats => "/stats",
    };
    log_command_start(command_name, admin_id, None);

    let lang = match User::language_of(&db.pool, admin_id).await {
        Ok(lang) => lang,
        Err(e) => {
            log_database_error("select", "users", &e.to_string());
            Language::from_code(from.language_code.as_deref())
        }
    };

    if !config.is_admin(admin_id) {
        tracing::warn!("User {} tried admin command {}", admin_id, command_name);
        send_screen(&bot, msg.chat.id, Screen::text_only(Text::AdminOnly.get(lang))).await?;
        return Ok(());
    }

    let now = Utc::now();
    let result = match cmd {
        AdminCommand::Grant(args) => handle_grant(&bot, &msg, &db, &config, admin_id, &args, &now).await,
        AdminCommand::Stats => handle_stats(&bot, &msg, &db, lang, &now).await,
    };

    match result {
        Ok(()) => log_command_success(command_name, admin_id, None),
        Err(e) => {
            log_command_error(command_name, admin_id, &e.to_string());
            CommandFeedback::new(bot, msg.chat.id)
                .error("Something went wrong, check the logs")
                .await?;
        }
    }
    Ok(())
}

async fn handle_grant(
    bot: &Bot,
    msg: &Message,
    db: &DatabaseManager,
    config: &Config,
    admin_id: i64,
    args: &str,
    now: &DateTime<Utc>,
) -> HandlerResult {
    let feedback = CommandFeedback::new(bot.clone(), msg.chat.id);

    let request = match parse_grant_args(args) {
        Ok(request) => request,
        Err(e) => {
            let plan_ids: Vec<&str> = Plan::ALL.iter().map(|plan| plan.id()).collect();
            let description = format!("{}.\nPlans: {}", e, plan_ids.join(", "));
            feedback.usage(GRANT_USAGE, &description, &GRANT_EXAMPLES).await?;
            return Ok(());
        }
    };

    let subscription = SubscriptionService::new(db.pool.clone())
        .grant(&request, admin_id, now)
        .await?;
    let end = subscription
        .end()
        .unwrap_or_else(|| *now + Duration::days(request.days));

    feedback
        .success(&format!(
            "Access granted to {}: {} for {} days, until {}",
            request.user_id,
            request.plan_type,
            request.days,
            format_date(&end)
        ))
        .await?;

    let lang = User::language_of(&db.pool, request.user_id).await?;
    let channel_link = config.channel_link();
    let notice = screens::access_granted(lang, &request.plan_type, &end, channel_link.as_deref());
    if let Err(e) = send_screen(bot, ChatId(request.user_id), notice).await {
        tracing::warn!("Could not notify user {} about their grant: {}", request.user_id, e);
    }

    Ok(())
}

async fn handle_stats(
    bot: &Bot,
    msg: &Message,
    db: &DatabaseManager,
    lang: Language,
    now: &DateTime<Utc>,
) -> HandlerResult {
    let stats = SubscriptionService::new(db.pool.clone()).admin_stats(now).await?;
    send_screen(bot, msg.chat.id, screens::admin_stats(lang, &stats)).await?;
    Ok(())
}
