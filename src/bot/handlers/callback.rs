use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use teloxide::prelude::*;

use crate::bot::callbacks::CallbackAction;
use crate::bot::handlers::{edit_screen, main_menu_screen, profile_of, send_screen, telegram_id, HandlerResult};
use crate::bot::screens::{self, Screen};
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::analytics::PLAN_SELECTED;
use crate::database::models::user_setting::{NOTIFICATIONS, ONBOARDING_COMPLETE};
use crate::database::models::{AnalyticsEvent, User, UserSetting};
use crate::i18n::{Language, Text};
use crate::services::subscription::SubscriptionService;
use crate::utils::logging::{log_command_error, log_database_error};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    let user_id = telegram_id(&q.from);
    let data = q.data.clone().unwrap_or_default();
    tracing::info!("Callback received: '{}' from user {}", data, user_id);

    let Some(action) = CallbackAction::parse(&data) else {
        let lang = Language::from_code(q.from.language_code.as_deref());
        bot.answer_callback_query(q.id.clone())
            .text(Text::UnknownAction.get(lang))
            .await?;
        return Ok(());
    };

    let now = Utc::now();
    let user = match User::upsert_from_telegram(&db.pool, &profile_of(&q.from), &now).await {
        Ok(user) => user,
        Err(e) => {
            log_database_error("upsert", "users", &e.to_string());
            let lang = Language::from_code(q.from.language_code.as_deref());
            bot.answer_callback_query(q.id.clone())
                .text(Text::InternalError.get(lang))
                .await?;
            return Ok(());
        }
    };

    if user.is_banned {
        bot.answer_callback_query(q.id.clone())
            .text(Text::Blocked.get(user.language()))
            .show_alert(true)
            .await?;
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone()).await?;

    // Buttons on inline-mode messages carry no message to edit
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };

    if let Err(e) = handle_action(&bot, message, action, &db, &config, &user, &now).await {
        log_command_error(&format!("callback:{data}"), user_id, &e.to_string());
        send_screen(&bot, message.chat.id, Screen::text_only(Text::InternalError.get(user.language()))).await?;
    }
    Ok(())
}

async fn handle_action(
    bot: &Bot,
    message: &Message,
    action: CallbackAction,
    db: &DatabaseManager,
    config: &Config,
    user: &User,
    now: &DateTime<Utc>,
) -> HandlerResult {
    let lang = user.language();
    let pool = &db.pool;

    let screen = match action {
        CallbackAction::SetLanguage(new_lang) => {
            User::set_language(pool, user.telegram_id, new_lang, now).await?;
            if UserSetting::onboarding_complete(pool, user.telegram_id).await? {
                let user = User {
                    language_code: new_lang.code().to_string(),
                    ..user.clone()
                };
                main_menu_screen(db, config, &user, now).await?
            } else {
                screens::age_verification(new_lang)
            }
        }
        CallbackAction::AgeVerify(true) => screens::terms(lang),
        CallbackAction::AgeVerify(false) => Screen::text_only(Text::AgeRestricted.get(lang)),
        CallbackAction::Terms(true) => {
            UserSetting::set(pool, user.telegram_id, ONBOARDING_COMPLETE, "true", now).await?;
            tracing::info!("User {} completed onboarding", user.telegram_id);
            edit_screen(bot, message, Screen::text_only(Text::OnboardingComplete.get(lang))).await?;
            let menu = main_menu_screen(db, config, user, now).await?;
            send_screen(bot, message.chat.id, menu).await?;
            return Ok(());
        }
        CallbackAction::Terms(false) => Screen::text_only(Text::TermsDeclined.get(lang)),
        CallbackAction::HomePlans => screens::plans(lang),
        CallbackAction::HomeStatus => {
            let status = SubscriptionService::new(pool.clone()).status(user.telegram_id, now).await?;
            screens::status(lang, &status)
        }
        CallbackAction::HomeSettings => {
            let enabled = UserSetting::notifications_enabled(pool, user.telegram_id).await?;
            screens::settings(lang, enabled)
        }
        CallbackAction::HomeHelp => screens::help(lang),
        CallbackAction::SelectPlan(plan_id) => {
            let data = json!({ "plan": plan_id });
            if let Err(e) =
                AnalyticsEvent::record(pool, config.enable_analytics, Some(user.telegram_id), PLAN_SELECTED, Some(&data), now).await
            {
                log_database_error("insert", "analytics_events", &e.to_string());
            }
            screens::plan_selected(lang, &plan_id, &config.payment_links)
        }
        CallbackAction::BackToStart => main_menu_screen(db, config, user, now).await?,
        CallbackAction::SettingsLanguage => screens::language_selection(),
        CallbackAction::SettingsNotifications => {
            let enabled = !UserSetting::notifications_enabled(pool, user.telegram_id).await?;
            UserSetting::set(pool, user.telegram_id, NOTIFICATIONS, if enabled { "true" } else { "false" }, now).await?;
            screens::settings(lang, enabled)
        }
        CallbackAction::AdminPanel | CallbackAction::AdminRefresh => {
            if !(config.enable_admin_panel && config.is_admin(user.telegram_id)) {
                tracing::warn!("User {} opened the admin panel without rights", user.telegram_id);
                send_screen(bot, message.chat.id, Screen::text_only(Text::AdminOnly.get(lang))).await?;
                return Ok(());
            }
            let stats = SubscriptionService::new(pool.clone()).admin_stats(now).await?;
            screens::admin_stats(lang, &stats)
        }
    };

    edit_screen(bot, message, screen).await?;
    Ok(())
}
