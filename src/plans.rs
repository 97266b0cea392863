//! The fixed catalogue of passes and where to pay for each one.

use std::collections::BTreeMap;
use std::env;

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// A pass sold by the bot. Ids are the strings used in callback data,
/// environment variable names and the `plan_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Plan {
    Week,
    Month,
    ThreeMonth,
    HalfYear,
    Year,
    Lifetime,
}

/// Default grant length for plan types outside the catalogue.
pub const DEFAULT_GRANT_DAYS: i64 = 30;

impl Plan {
    /// Display order.
    pub const ALL: [Plan; 6] = [
        Plan::Week,
        Plan::Month,
        Plan::ThreeMonth,
        Plan::HalfYear,
        Plan::Year,
        Plan::Lifetime,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Plan::Week => "week",
            Plan::Month => "month",
            Plan::ThreeMonth => "3month",
            Plan::HalfYear => "halfyear",
            Plan::Year => "year",
            Plan::Lifetime => "lifetime",
        }
    }

    pub fn from_id(id: &str) -> Option<Plan> {
        Plan::ALL.into_iter().find(|plan| plan.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::Week => "WEEK PASS",
            Plan::Month => "MONTH PASS",
            Plan::ThreeMonth => "3 MONTH PASS",
            Plan::HalfYear => "1/2 YEAR PASS",
            Plan::Year => "1 YEAR PASS",
            Plan::Lifetime => "LIFETIME PASS",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Plan::Week => 7,
            Plan::Month => 30,
            Plan::ThreeMonth => 90,
            Plan::HalfYear => 180,
            Plan::Year => 365,
            Plan::Lifetime => 9999,
        }
    }

    /// Price in US cents.
    pub fn price_cents(&self) -> u32 {
        match self {
            Plan::Week => 1499,
            Plan::Month => 2499,
            Plan::ThreeMonth => 4999,
            Plan::HalfYear => 7999,
            Plan::Year => 9999,
            Plan::Lifetime => 14999,
        }
    }

    pub fn price_label(&self) -> String {
        let cents = self.price_cents();
        format!("${}.{:02}", cents / 100, cents % 100)
    }

    pub fn description(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Plan::Week, Language::Es) => "Acceso total a PNP TV por 7 días 🔥",
            (Plan::Week, Language::En) => "Full access to PNP TV for 7 days 🔥",
            (Plan::Month, Language::Es) => "Un mes entero de shows sin límites 💦",
            (Plan::Month, Language::En) => "A full month of unlimited shows 💦",
            (Plan::ThreeMonth, Language::Es) => "3 meses de acceso VIP. ¡Ahorra y disfruta más! 💎",
            (Plan::ThreeMonth, Language::En) => "3 months of VIP access. Save more and enjoy more! 💎",
            (Plan::HalfYear, Language::Es) => "6 meses de acceso full a la experiencia PNP 🔥🔥",
            (Plan::HalfYear, Language::En) => "6 months of full access to the PNP experience 🔥🔥",
            (Plan::Year, Language::Es) => "Todo un año con los mejores shows de PNP 🖤",
            (Plan::Year, Language::En) => "A full year with PNP's best shows 🖤",
            (Plan::Lifetime, Language::Es) => "Acceso ilimitado para siempre 🖤🔥",
            (Plan::Lifetime, Language::En) => "Unlimited access forever 🖤🔥",
        }
    }

    /// Environment variable holding this plan's checkout link.
    pub fn payment_link_var(&self) -> &'static str {
        match self {
            Plan::Week => "WEEK_PAYMENT_LINK",
            Plan::Month => "MONTH_PAYMENT_LINK",
            Plan::ThreeMonth => "3MONTH_PAYMENT_LINK",
            Plan::HalfYear => "HALFYEAR_PAYMENT_LINK",
            Plan::Year => "YEAR_PAYMENT_LINK",
            Plan::Lifetime => "LIFETIME_PAYMENT_LINK",
        }
    }
}

/// Grant length for a `plan_type` as typed by an admin.
pub fn default_days_for(plan_type: &str) -> i64 {
    Plan::from_id(plan_type).map_or(DEFAULT_GRANT_DAYS, |plan| plan.days())
}

/// External checkout links, one per plan. Blank values count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentLinks {
    links: BTreeMap<Plan, String>,
}

impl PaymentLinks {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let links = Plan::ALL
            .into_iter()
            .filter_map(|plan| {
                lookup(plan.payment_link_var())
                    .map(|link| link.trim().to_string())
                    .filter(|link| !link.is_empty())
                    .map(|link| (plan, link))
            })
            .collect();
        Self { links }
    }

    pub fn get(&self, plan: Plan) -> Option<&str> {
        self.links.get(&plan).map(String::as_str)
    }

    /// Plans without a link, in display order.
    pub fn missing(&self) -> Vec<Plan> {
        Plan::ALL
            .into_iter()
            .filter(|plan| !self.links.contains_key(plan))
            .collect()
    }

    pub fn configured_count(&self) -> usize {
        self.links.len()
    }
}
