//! Data carried by inline keyboard buttons.
//!
//! Telegram limits callback data to 64 bytes, so actions are encoded as
//! short flat strings such as `select_plan_month`.

use crate::i18n::Language;

const SELECT_PLAN_PREFIX: &str = "select_plan_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    SetLanguage(Language),
    AgeVerify(bool),
    Terms(bool),
    HomePlans,
    HomeStatus,
    HomeSettings,
    HomeHelp,
    /// Plan id as sent by the button; not checked against the catalogue.
    SelectPlan(String),
    BackToStart,
    SettingsLanguage,
    SettingsNotifications,
    AdminPanel,
    AdminRefresh,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<CallbackAction> {
        let action = match data {
            "set_lang_es" => CallbackAction::SetLanguage(Language::Es),
            "set_lang_en" => CallbackAction::SetLanguage(Language::En),
            "age_verify_yes" => CallbackAction::AgeVerify(true),
            "age_verify_no" => CallbackAction::AgeVerify(false),
            "terms_accept" => CallbackAction::Terms(true),
            "terms_decline" => CallbackAction::Terms(false),
            "home_plans" => CallbackAction::HomePlans,
            "home_status" => CallbackAction::HomeStatus,
            "home_settings" => CallbackAction::HomeSettings,
            "home_help" => CallbackAction::HomeHelp,
            "back_to_start" => CallbackAction::BackToStart,
            "settings_language" => CallbackAction::SettingsLanguage,
            "settings_notifications" => CallbackAction::SettingsNotifications,
            "admin_panel" => CallbackAction::AdminPanel,
            "admin_refresh" => CallbackAction::AdminRefresh,
            other => {
                let plan_id = other.strip_prefix(SELECT_PLAN_PREFIX)?;
                CallbackAction::SelectPlan(plan_id.to_string())
            }
        };
        Some(action)
    }

    pub fn as_data(&self) -> String {
        match self {
            CallbackAction::SetLanguage(lang) => format!("set_lang_{}", lang.code()),
            CallbackAction::AgeVerify(true) => "age_verify_yes".to_string(),
            CallbackAction::AgeVerify(false) => "age_verify_no".to_string(),
            CallbackAction::Terms(true) => "terms_accept".to_string(),
            CallbackAction::Terms(false) => "terms_decline".to_string(),
            CallbackAction::HomePlans => "home_plans".to_string(),
            CallbackAction::HomeStatus => "home_status".to_string(),
            CallbackAction::HomeSettings => "home_settings".to_string(),
            CallbackAction::HomeHelp => "home_help".to_string(),
            CallbackAction::SelectPlan(plan_id) => format!("{SELECT_PLAN_PREFIX}{plan_id}"),
            CallbackAction::BackToStart => "back_to_start".to_string(),
            CallbackAction::SettingsLanguage => "settings_language".to_string(),
            CallbackAction::SettingsNotifications => "settings_notifications".to_string(),
            CallbackAction::AdminPanel => "admin_panel".to_string(),
            CallbackAction::AdminRefresh => "admin_refresh".to_string(),
        }
    }
}
