//! Spanish and English message catalogue.
//!
//! Templates are plain text with `{placeholder}` markers; callers fill them
//! with [`fill`] and escape the result for MarkdownV2 before sending.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    /// Telegram language codes like `en-US` map to English; anything else,
    /// including a missing code, falls back to Spanish.
    pub fn from_code(code: Option<&str>) -> Language {
        match code {
            Some(code) if code.trim().to_lowercase().starts_with("en") => Language::En,
            _ => Language::Es,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

/// Replaces each `{key}` in `template` with its value in a single pass.
/// Substituted values are never scanned again, so a value containing
/// `{other_key}` stays literal.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Text {
    WelcomeTitle,
    WelcomeBody,
    SubscriptionActive,
    SubscriptionInactive,
    DetailedStatusActive,
    AccessChannel,
    ViewPlans,
    MyStatus,
    Settings,
    Help,
    AdminPanel,
    LanguagePrompt,
    AgeVerification,
    AgeYes,
    AgeNo,
    AgeRestricted,
    Terms,
    AcceptTerms,
    DeclineTerms,
    TermsDeclined,
    OnboardingComplete,
    PlansHeader,
    BackToMenu,
    InvalidPlan,
    PaymentLinkUnavailable,
    PaymentInstructions,
    PayNow,
    ViewOtherPlans,
    SettingsMenu,
    ChangeLanguage,
    NotificationsOn,
    NotificationsOff,
    NotificationsEnabled,
    NotificationsDisabled,
    HelpMenu,
    ContactSupport,
    InternalError,
    Blocked,
    UnknownAction,
    AccessGranted,
    ExpiryReminder,
    SubscriptionExpired,
    AdminOnly,
    AdminStats,
    Refresh,
}

impl Text {
    pub fn get(&self, lang: Language) -> &'static str {
        match lang {
            Language::Es => self.es(),
            Language::En => self.en(),
        }
    }

    fn es(&self) -> &'static str {
        match self {
            Text::WelcomeTitle => "🎬 Bienvenidx a {channel_name}, {user_name}",
            Text::WelcomeBody => "Tu portal exclusivo a la experiencia más intensa de la red.\n\n\
                🌈 ¿Qué incluye tu suscripción?\n\
                • Acceso a shows en vivo y grabados\n\
                • Performers sin censura\n\
                • Salas VIP\n\
                • Comunidad 24/7 en constante expansión\n\n\
                👉 Elige un plan para entrar al universo de PNP.",
            Text::SubscriptionActive => "✅ Tu acceso está ACTIVO hasta el: {expiry_date}",
            Text::SubscriptionInactive => "🚫 No tienes una suscripción activa.\nActiva tu acceso para entrar a los canales privados 🔐",
            Text::DetailedStatusActive => "✅ Suscripción activa\n\n\
                📝 Plan: {plan_type}\n\
                📅 Inicio: {start_date}\n\
                ⏳ Vence: {end_date}\n\
                🔢 Días restantes: {days_left}",
            Text::AccessChannel => "📺 Entrar al canal",
            Text::ViewPlans => "💎 Ver Planes",
            Text::MyStatus => "👤 Mi Estado",
            Text::Settings => "⚙️ Ajustes",
            Text::Help => "❓ Ayuda",
            Text::AdminPanel => "👑 Panel de Admin",
            Text::LanguagePrompt => Self::LANGUAGE_PROMPT,
            Text::AgeVerification => "🔞 Este canal es solo para adultos.\n\n¿Confirmas que tienes 18 años o más?",
            Text::AgeYes => "✅ Sí, tengo 18+",
            Text::AgeNo => "❌ No",
            Text::AgeRestricted => "🚫 Lo sentimos, debes ser mayor de edad para usar este servicio.",
            Text::Terms => "📜 Términos y condiciones\n\n\
                • El acceso es personal e intransferible.\n\
                • Está prohibido redistribuir el contenido.\n\
                • Los pagos no son reembolsables.\n\n\
                ¿Aceptas los términos?",
            Text::AcceptTerms => "✅ Acepto",
            Text::DeclineTerms => "❌ No acepto",
            Text::TermsDeclined => "Debes aceptar los términos para continuar. Usa /start cuando quieras intentarlo de nuevo.",
            Text::OnboardingComplete => "🎉 ¡Listo! Tu perfil está configurado.",
            Text::PlansHeader => "💳 Elige tu Pase PNP:",
            Text::BackToMenu => "🔙 Volver",
            Text::InvalidPlan => "❌ Plan no válido",
            Text::PaymentLinkUnavailable => "❌ Enlace de pago no disponible. Contacta a @soporte_pnptv",
            Text::PaymentInstructions => "💳 Instrucciones de Pago\n\n\
                📝 Plan: {plan_name}\n\
                💰 Precio: {price}\n\n\
                1️⃣ Haz clic en el botón de pago\n\
                2️⃣ Finaliza tu compra\n\
                3️⃣ Envíanos el comprobante a @soporte_pnptv\n\
                4️⃣ Recibe tu acceso exclusivo al canal",
            Text::PayNow => "💳 Pagar Ahora",
            Text::ViewOtherPlans => "🔙 Ver Otros Planes",
            Text::SettingsMenu => "⚙️ Ajustes\n\nIdioma actual: Español\nNotificaciones: {notifications}",
            Text::ChangeLanguage => "🌍 Cambiar idioma",
            Text::NotificationsOn => "🔔 Notificaciones: activadas",
            Text::NotificationsOff => "🔕 Notificaciones: desactivadas",
            Text::NotificationsEnabled => "activadas",
            Text::NotificationsDisabled => "desactivadas",
            Text::HelpMenu => "🛠 Centro de Soporte PNP\n\n\
                Comandos disponibles:\n\
                • /start → Menú principal\n\
                • /status → Ver tu suscripción\n\
                • /plans → Ver opciones de pase\n\
                • /help → Esta ayuda\n\n\
                👑 Soporte directo: @soporte_pnptv",
            Text::ContactSupport => "💬 Contactar Soporte",
            Text::InternalError => "❌ Error interno. Por favor, inténtalo de nuevo más tarde.",
            Text::Blocked => "🚫 Tu cuenta está bloqueada. Contacta a @soporte_pnptv",
            Text::UnknownAction => "❌ Acción no reconocida",
            Text::AccessGranted => "🎉 Acceso confirmado\n\n\
                Tu pase {plan_name} ya está activo hasta el {expiry_date}.",
            Text::ExpiryReminder => "⏰ Tu suscripción vence en {days_left} día(s), el {expiry_date}.\n\nRenueva para no perder el acceso.",
            Text::SubscriptionExpired => "⌛ Tu suscripción ha vencido y se retiró tu acceso al canal.\n\nElige un nuevo pase para volver.",
            Text::AdminOnly => "🔒 Solo para administradores",
            Text::AdminStats => "👑 Panel de Admin\n\n\
                👥 Usuarios: {total_users}\n\
                ✅ Suscripciones activas: {active_subscriptions}\n\
                ⏰ Vencen en 3 días: {expiring_soon}\n\n\
                Activas por plan:\n{by_plan}",
            Text::Refresh => "🔄 Actualizar",
        }
    }

    fn en(&self) -> &'static str {
        match self {
            Text::WelcomeTitle => "🎬 Welcome to {channel_name}, {user_name}",
            Text::WelcomeBody => "Your exclusive portal to the most intense experience online.\n\n\
                🌈 What does your subscription include?\n\
                • Live and recorded shows\n\
                • Uncensored performers\n\
                • VIP rooms\n\
                • A 24/7 community that keeps growing\n\n\
                👉 Pick a plan to enter the PNP universe.",
            Text::SubscriptionActive => "✅ Your access is ACTIVE until: {expiry_date}",
            Text::SubscriptionInactive => "🚫 You don't have an active subscription.\nActivate your access to join the private channels 🔐",
            Text::DetailedStatusActive => "✅ Active subscription\n\n\
                📝 Plan: {plan_type}\n\
                📅 Started: {start_date}\n\
                ⏳ Expires: {end_date}\n\
                🔢 Days left: {days_left}",
            Text::AccessChannel => "📺 Enter channel",
            Text::ViewPlans => "💎 View Plans",
            Text::MyStatus => "👤 My Status",
            Text::Settings => "⚙️ Settings",
            Text::Help => "❓ Help",
            Text::AdminPanel => "👑 Admin Panel",
            Text::LanguagePrompt => Self::LANGUAGE_PROMPT,
            Text::AgeVerification => "🔞 This channel is for adults only.\n\nDo you confirm you are 18 or older?",
            Text::AgeYes => "✅ Yes, I'm 18+",
            Text::AgeNo => "❌ No",
            Text::AgeRestricted => "🚫 Sorry, you must be an adult to use this service.",
            Text::Terms => "📜 Terms and conditions\n\n\
                • Access is personal and non-transferable.\n\
                • Redistributing content is forbidden.\n\
                • Payments are non-refundable.\n\n\
                Do you accept the terms?",
            Text::AcceptTerms => "✅ I accept",
            Text::DeclineTerms => "❌ I decline",
            Text::TermsDeclined => "You need to accept the terms to continue. Use /start whenever you want to try again.",
            Text::OnboardingComplete => "🎉 All set! Your profile is ready.",
            Text::PlansHeader => "💳 Choose your PNP Pass:",
            Text::BackToMenu => "🔙 Back",
            Text::InvalidPlan => "❌ Invalid plan",
            Text::PaymentLinkUnavailable => "❌ Payment link unavailable. Contact @soporte_pnptv",
            Text::PaymentInstructions => "💳 Payment Instructions\n\n\
                📝 Plan: {plan_name}\n\
                💰 Price: {price}\n\n\
                1️⃣ Tap the payment button\n\
                2️⃣ Complete your purchase\n\
                3️⃣ Send the receipt to @soporte_pnptv\n\
                4️⃣ Get your exclusive channel access",
            Text::PayNow => "💳 Pay Now",
            Text::ViewOtherPlans => "🔙 See Other Plans",
            Text::SettingsMenu => "⚙️ Settings\n\nCurrent language: English\nNotifications: {notifications}",
            Text::ChangeLanguage => "🌍 Change language",
            Text::NotificationsOn => "🔔 Notifications: on",
            Text::NotificationsOff => "🔕 Notifications: off",
            Text::NotificationsEnabled => "on",
            Text::NotificationsDisabled => "off",
            Text::HelpMenu => "🛠 PNP Support Center\n\n\
                Available commands:\n\
                • /start → Main menu\n\
                • /status → See your subscription\n\
                • /plans → See pass options\n\
                • /help → This help\n\n\
                👑 Direct support: @soporte_pnptv",
            Text::ContactSupport => "💬 Contact Support",
            Text::InternalError => "❌ Internal error. Please try again later.",
            Text::Blocked => "🚫 Your account is blocked. Contact @soporte_pnptv",
            Text::UnknownAction => "❌ Unrecognised action",
            Text::AccessGranted => "🎉 Access confirmed\n\n\
                Your {plan_name} pass is active until {expiry_date}.",
            Text::ExpiryReminder => "⏰ Your subscription expires in {days_left} day(s), on {expiry_date}.\n\nRenew to keep your access.",
            Text::SubscriptionExpired => "⌛ Your subscription has expired and your channel access was removed.\n\nPick a new pass to come back.",
            Text::AdminOnly => "🔒 Admins only",
            Text::AdminStats => "👑 Admin Panel\n\n\
                👥 Users: {total_users}\n\
                ✅ Active subscriptions: {active_subscriptions}\n\
                ⏰ Expiring within 3 days: {expiring_soon}\n\n\
                Active by plan:\n{by_plan}",
            Text::Refresh => "🔄 Refresh",
        }
    }

    const LANGUAGE_PROMPT: &'static str = "🌍 Selecciona tu idioma / Choose your language\n\n\
        Elige tu idioma preferido para continuar.\n\
        Choose your preferred language to continue.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_code() {
        assert_eq!(Language::from_code(Some("en")), Language::En);
        assert_eq!(Language::from_code(Some("en-GB")), Language::En);
        assert_eq!(Language::from_code(Some("es-CO")), Language::Es);
        assert_eq!(Language::from_code(Some("pt-br")), Language::Es);
        assert_eq!(Language::from_code(None), Language::Es);
    }

    #[test]
    fn test_fill_replaces_every_occurrence() {
        let text = fill(
            "{name} / {name} - {price}",
            &[("name", "WEEK PASS"), ("price", "$14.99")],
        );
        assert_eq!(text, "WEEK PASS / WEEK PASS - $14.99");
    }

    #[test]
    fn test_fill_does_not_expand_inside_values() {
        let text = fill(
            "Plan: {plan_type}, until {expiry_date}",
            &[("plan_type", "{expiry_date}"), ("expiry_date", "07/03/2025")],
        );
        assert_eq!(text, "Plan: {expiry_date}, until 07/03/2025");

        assert_eq!(fill("{a}{b} {", &[("a", "{b}"), ("b", "x")]), "{b}x {");
    }

    #[test]
    fn test_fill_leaves_unknown_placeholders() {
        assert_eq!(fill("Hi {user_name}", &[("other", "x")]), "Hi {user_name}");
    }

    #[test]
    fn test_templates_carry_their_placeholders_in_both_languages() {
        let expectations = [
            (Text::WelcomeTitle, vec!["{channel_name}", "{user_name}"]),
            (Text::SubscriptionActive, vec!["{expiry_date}"]),
            (Text::PaymentInstructions, vec!["{plan_name}", "{price}"]),
            (Text::DetailedStatusActive, vec!["{plan_type}", "{start_date}", "{end_date}", "{days_left}"]),
            (Text::ExpiryReminder, vec!["{days_left}", "{expiry_date}"]),
            (Text::AccessGranted, vec!["{plan_name}", "{expiry_date}"]),
        ];

        for (text, placeholders) in expectations {
            for lang in [Language::Es, Language::En] {
                for placeholder in &placeholders {
                    assert!(
                        text.get(lang).contains(placeholder),
                        "{:?} in {:?} is missing {}",
                        text,
                        lang,
                        placeholder
                    );
                }
            }
        }
    }
}
