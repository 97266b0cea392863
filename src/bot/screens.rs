//! Text and keyboards for every menu the bot shows.
//!
//! Builders here are pure so menus can be checked without a Telegram
//! connection; handlers decide whether a screen is sent or edited in place.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

use crate::bot::callbacks::CallbackAction;
use crate::bot::SUPPORT_URL;
use crate::i18n::{fill, Language, Text};
use crate::plans::{PaymentLinks, Plan};
use crate::services::subscription::{AccessStatus, AdminStats};
use crate::utils::datetime::format_date;
use crate::utils::markdown::escape_markdown;

/// A MarkdownV2 message body with an optional inline keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Screen {
    /// Escapes `plain` for MarkdownV2.
    pub fn new(plain: &str, rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            text: escape_markdown(plain),
            keyboard: if rows.is_empty() {
                None
            } else {
                Some(InlineKeyboardMarkup::new(rows))
            },
        }
    }

    pub fn text_only(plain: &str) -> Self {
        Self::new(plain, Vec::new())
    }

    /// All callback data strings on the keyboard, in order.
    pub fn callback_data(&self) -> Vec<String> {
        use teloxide::types::InlineKeyboardButtonKind;

        self.keyboard
            .iter()
            .flat_map(|kb| kb.inline_keyboard.iter().flatten())
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        use teloxide::types::InlineKeyboardButtonKind;

        self.keyboard
            .iter()
            .flat_map(|kb| kb.inline_keyboard.iter().flatten())
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::Url(url) => Some(url.to_string()),
                _ => None,
            })
            .collect()
    }
}

fn button(text: &str, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), action.as_data())
}

fn url_button(text: &str, link: &str) -> Option<InlineKeyboardButton> {
    match Url::parse(link) {
        Ok(url) => Some(InlineKeyboardButton::url(text.to_string(), url)),
        Err(e) => {
            tracing::warn!("Skipping button with invalid URL {}: {}", link, e);
            None
        }
    }
}

fn back_button(lang: Language) -> InlineKeyboardButton {
    button(Text::BackToMenu.get(lang), CallbackAction::BackToStart)
}

pub fn language_selection() -> Screen {
    Screen::new(
        Text::LanguagePrompt.get(Language::default()),
        vec![vec![
            button("🇪🇸 Español", CallbackAction::SetLanguage(Language::Es)),
            button("🇺🇸 English", CallbackAction::SetLanguage(Language::En)),
        ]],
    )
}

pub fn age_verification(lang: Language) -> Screen {
    Screen::new(
        Text::AgeVerification.get(lang),
        vec![vec![
            button(Text::AgeYes.get(lang), CallbackAction::AgeVerify(true)),
            button(Text::AgeNo.get(lang), CallbackAction::AgeVerify(false)),
        ]],
    )
}

pub fn terms(lang: Language) -> Screen {
    Screen::new(
        Text::Terms.get(lang),
        vec![vec![
            button(Text::AcceptTerms.get(lang), CallbackAction::Terms(true)),
            button(Text::DeclineTerms.get(lang), CallbackAction::Terms(false)),
        ]],
    )
}

/// Everything the main menu depends on.
pub struct MainMenu<'a> {
    pub lang: Language,
    pub channel_name: &'a str,
    pub channel_link: Option<&'a str>,
    pub user_name: &'a str,
    pub status: &'a AccessStatus,
    pub show_admin: bool,
}

pub fn main_menu(menu: &MainMenu<'_>) -> Screen {
    let lang = menu.lang;
    let title = fill(
        Text::WelcomeTitle.get(lang),
        &[("channel_name", menu.channel_name), ("user_name", menu.user_name)],
    );
    let status_line = match menu.status {
        AccessStatus::Active { end, .. } => {
            fill(Text::SubscriptionActive.get(lang), &[("expiry_date", &format_date(end))])
        }
        AccessStatus::Inactive => Text::SubscriptionInactive.get(lang).to_string(),
    };
    let text = format!("{}\n\n{}\n\n{}", title, Text::WelcomeBody.get(lang), status_line);

    let mut rows = Vec::new();
    if menu.status.is_active() {
        if let Some(link) = menu.channel_link.and_then(|link| url_button(Text::AccessChannel.get(lang), link)) {
            rows.push(vec![link]);
        }
    }
    rows.push(vec![button(Text::ViewPlans.get(lang), CallbackAction::HomePlans)]);
    rows.push(vec![button(Text::MyStatus.get(lang), CallbackAction::HomeStatus)]);
    rows.push(vec![
        button(Text::Settings.get(lang), CallbackAction::HomeSettings),
        button(Text::Help.get(lang), CallbackAction::HomeHelp),
    ]);
    if menu.show_admin {
        rows.push(vec![button(Text::AdminPanel.get(lang), CallbackAction::AdminPanel)]);
    }

    Screen::new(&text, rows)
}

pub fn plans(lang: Language) -> Screen {
    let mut text = Text::PlansHeader.get(lang).to_string();
    let mut rows = Vec::new();

    for plan in Plan::ALL {
        text.push_str(&format!(
            "\n\n{} - {}\n{}",
            plan.name(),
            plan.price_label(),
            plan.description(lang)
        ));
        rows.push(vec![button(
            &format!("{} - {}", plan.name(), plan.price_label()),
            CallbackAction::SelectPlan(plan.id().to_string()),
        )]);
    }
    rows.push(vec![back_button(lang)]);

    Screen::new(&text, rows)
}

pub fn plan_selected(lang: Language, plan_id: &str, links: &PaymentLinks) -> Screen {
    let back_to_plans = vec![vec![button(Text::ViewOtherPlans.get(lang), CallbackAction::HomePlans)]];

    let Some(plan) = Plan::from_id(plan_id) else {
        return Screen::new(Text::InvalidPlan.get(lang), back_to_plans);
    };

    let Some(pay_button) = links
        .get(plan)
        .and_then(|link| url_button(Text::PayNow.get(lang), link))
    else {
        return Screen::new(Text::PaymentLinkUnavailable.get(lang), back_to_plans);
    };

    let text = fill(
        Text::PaymentInstructions.get(lang),
        &[("plan_name", plan.name()), ("price", &plan.price_label())],
    );
    let mut rows = vec![vec![pay_button]];
    rows.extend(back_to_plans);
    Screen::new(&text, rows)
}

pub fn status(lang: Language, status: &AccessStatus) -> Screen {
    let text = match status {
        AccessStatus::Active {
            plan_type,
            start,
            end,
            days_left,
        } => {
            let plan_name = Plan::from_id(plan_type).map_or(plan_type.as_str(), |plan| plan.name());
            fill(
                Text::DetailedStatusActive.get(lang),
                &[
                    ("plan_type", plan_name),
                    ("start_date", &format_date(start)),
                    ("end_date", &format_date(end)),
                    ("days_left", &days_left.to_string()),
                ],
            )
        }
        AccessStatus::Inactive => Text::SubscriptionInactive.get(lang).to_string(),
    };

    Screen::new(
        &text,
        vec![
            vec![button(Text::ViewPlans.get(lang), CallbackAction::HomePlans)],
            vec![back_button(lang)],
        ],
    )
}

pub fn settings(lang: Language, notifications_enabled: bool) -> Screen {
    let (state, toggle) = if notifications_enabled {
        (Text::NotificationsEnabled, Text::NotificationsOn)
    } else {
        (Text::NotificationsDisabled, Text::NotificationsOff)
    };
    let text = fill(Text::SettingsMenu.get(lang), &[("notifications", state.get(lang))]);

    Screen::new(
        &text,
        vec![
            vec![button(Text::ChangeLanguage.get(lang), CallbackAction::SettingsLanguage)],
            vec![button(toggle.get(lang), CallbackAction::SettingsNotifications)],
            vec![back_button(lang)],
        ],
    )
}

pub fn help(lang: Language) -> Screen {
    let mut rows = Vec::new();
    if let Some(support) = url_button(Text::ContactSupport.get(lang), SUPPORT_URL) {
        rows.push(vec![support]);
    }
    rows.push(vec![back_button(lang)]);
    Screen::new(Text::HelpMenu.get(lang), rows)
}

pub fn admin_stats(lang: Language, stats: &AdminStats) -> Screen {
    let by_plan = if stats.by_plan.is_empty() {
        "• -".to_string()
    } else {
        stats
            .by_plan
            .iter()
            .map(|(plan_type, count)| {
                let name = Plan::from_id(plan_type).map_or(plan_type.as_str(), |plan| plan.name());
                format!("• {}: {}", name, count)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let text = fill(
        Text::AdminStats.get(lang),
        &[
            ("total_users", &stats.total_users.to_string()),
            ("active_subscriptions", &stats.active_subscriptions.to_string()),
            ("expiring_soon", &stats.expiring_soon.to_string()),
            ("by_plan", &by_plan),
        ],
    );

    Screen::new(
        &text,
        vec![
            vec![button(Text::Refresh.get(lang), CallbackAction::AdminRefresh)],
            vec![back_button(lang)],
        ],
    )
}

/// Message sent to a user once an admin grants them access.
pub fn access_granted(lang: Language, plan_type: &str, end: &chrono::DateTime<chrono::Utc>, channel_link: Option<&str>) -> Screen {
    let plan_name = Plan::from_id(plan_type).map_or(plan_type, |plan| plan.name());
    let text = fill(
        Text::AccessGranted.get(lang),
        &[("plan_name", plan_name), ("expiry_date", &format_date(end))],
    );
    let rows = channel_link
        .and_then(|link| url_button(Text::AccessChannel.get(lang), link))
        .map(|b| vec![vec![b]])
        .unwrap_or_default();
    Screen::new(&text, rows)
}
