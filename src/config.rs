use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::plans::PaymentLinks;
use crate::utils::datetime::file_stamp;
use crate::utils::validation::{validate_channel_id, validate_payment_link};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/pnp_bot.db";
pub const DEFAULT_CHANNEL_ID: &str = "@your_private_channel";
pub const DEFAULT_CHANNEL_NAME: &str = "PNP Television";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
/// Real bot tokens are `<digits>:<35 chars>`, so anything shorter is a typo.
pub const MIN_TOKEN_LEN: usize = 40;

const VALID_LOG_LEVELS: [&str; 6] = ["DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL"];

#[derive(Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub admin_ids: Vec<i64>,
    pub channel_id: String,
    pub channel_name: String,
    pub database_url: String,
    pub log_level: String,
    pub log_file: String,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub enable_scheduler: bool,
    pub enable_admin_panel: bool,
    pub enable_analytics: bool,
    pub debug_mode: bool,
    pub http_port: u16,
    pub payment_links: PaymentLinks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub message: String,
}

impl ConfigIssue {
    fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into() }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = non_blank_var("BOT_TOKEN")
            .or_else(|| non_blank_var("TELEGRAM_TOKEN"))
            .ok_or_else(|| anyhow!("BOT_TOKEN must be set"))?;

        let admin_sources = [env::var("ADMIN_IDS").ok(), env::var("ADMIN_USER_ID").ok()];
        let admin_ids = parse_admin_ids(admin_sources.iter().flatten().map(String::as_str));

        let database_url = database_url_from_env();

        let http_port = match non_blank_var("PORT") {
            Some(port) => port.trim().parse().map_err(|_| anyhow!("Invalid PORT"))?,
            None => parse_var("HTTP_PORT", DEFAULT_HTTP_PORT)?,
        };

        Ok(Config {
            telegram_bot_token: token.trim().to_string(),
            admin_ids,
            channel_id: non_blank_var("CHANNEL_ID").unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string()),
            channel_name: non_blank_var("CHANNEL_NAME").unwrap_or_else(|| DEFAULT_CHANNEL_NAME.to_string()),
            database_url,
            log_level: non_blank_var("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string()),
            log_file: non_blank_var("LOG_FILE").unwrap_or_else(|| "logs/bot.log".to_string()),
            max_retries: parse_var("MAX_RETRIES", 3)?,
            retry_delay_secs: parse_var("RETRY_DELAY", 5)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT", 10)?,
            enable_scheduler: flag_var("ENABLE_SCHEDULER", true),
            enable_admin_panel: flag_var("ENABLE_ADMIN_PANEL", true),
            enable_analytics: flag_var("ENABLE_ANALYTICS", true),
            debug_mode: flag_var("DEBUG_MODE", false),
            http_port,
            payment_links: PaymentLinks::from_env(),
        })
    }

    /// Problems found in an otherwise loadable configuration. Startup
    /// refuses to continue when any of them is an error.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.telegram_bot_token.len() < MIN_TOKEN_LEN {
            issues.push(ConfigIssue::error("BOT_TOKEN appears to be invalid (too short)"));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.trim().to_uppercase().as_str()) {
            issues.push(ConfigIssue::error(format!("Invalid log level: {}", self.log_level)));
        }

        if self.max_retries == 0 {
            issues.push(ConfigIssue::error("MAX_RETRIES must be at least 1"));
        }

        if self.admin_ids.is_empty() {
            issues.push(ConfigIssue::warning("No admin user configured (ADMIN_IDS / ADMIN_USER_ID)"));
        }

        if let Err(e) = validate_channel_id(&self.channel_id) {
            issues.push(ConfigIssue::warning(format!("CHANNEL_ID: {e}")));
        }

        let missing = self.payment_links.missing();
        if !missing.is_empty() {
            let vars: Vec<&str> = missing.iter().map(|plan| plan.payment_link_var()).collect();
            issues.push(ConfigIssue::warning(format!("Missing payment links: {}", vars.join(", "))));
        }

        for plan in crate::plans::Plan::ALL {
            if let Some(link) = self.payment_links.get(plan) {
                if let Err(e) = validate_payment_link(link) {
                    issues.push(ConfigIssue::warning(format!("{}: {}", plan.payment_link_var(), e)));
                }
            }
        }

        issues
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Public `t.me` link for `@username` channels. Private channels
    /// addressed by numeric id have no such link.
    pub fn channel_link(&self) -> Option<String> {
        self.channel_id
            .trim()
            .strip_prefix('@')
            .filter(|name| !name.is_empty())
            .map(|name| format!("https://t.me/{name}"))
    }

    /// Loggable view of the configuration with secrets hidden.
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "telegram_token": if self.telegram_bot_token.is_empty() { "NOT_SET" } else { "***HIDDEN***" },
            "admin_ids": self.admin_ids,
            "channel_id": self.channel_id,
            "channel_name": self.channel_name,
            "database_url": self.database_url,
            "log_level": self.log_level,
            "log_file": self.log_file,
            "max_retries": self.max_retries,
            "retry_delay": self.retry_delay_secs,
            "request_timeout": self.request_timeout_secs,
            "enable_scheduler": self.enable_scheduler,
            "enable_admin_panel": self.enable_admin_panel,
            "enable_analytics": self.enable_analytics,
            "debug_mode": self.debug_mode,
            "http_port": self.http_port,
            "payment_links_configured": self.payment_links.configured_count(),
        })
    }

    /// Writes [`Config::summary`] to `dir/config_backup_<stamp>.json`.
    pub fn save_backup(&self, dir: &Path, now: &DateTime<Utc>) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create backup directory {}", dir.display()))?;
        let path = dir.join(format!("config_backup_{}.json", file_stamp(now)));
        let body = serde_json::to_string_pretty(&self.summary())?;
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"***HIDDEN***")
            .field("admin_ids", &self.admin_ids)
            .field("channel_id", &self.channel_id)
            .field("database_url", &self.database_url)
            .field("http_port", &self.http_port)
            .finish_non_exhaustive()
    }
}

/// Collects numeric ids from comma separated lists, dropping anything that
/// is not a positive integer and keeping the first occurrence of each id.
pub fn parse_admin_ids<'a>(sources: impl IntoIterator<Item = &'a str>) -> Vec<i64> {
    let mut ids = Vec::new();
    for source in sources {
        for part in source.split(',') {
            if let Ok(id) = part.trim().parse::<i64>() {
                if id > 0 && !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

/// `DATABASE_URL`, normalised, or the default. Needs no bot token, so
/// database tooling can run without one.
pub fn database_url_from_env() -> String {
    non_blank_var("DATABASE_URL")
        .map(|url| normalize_database_url(&url))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Accepts SQLAlchemy-style `sqlite:///relative/path.db` URLs as well as
/// the `sqlite:` form sqlx expects.
pub fn normalize_database_url(url: &str) -> String {
    let url = url.trim();
    match url.strip_prefix("sqlite:///") {
        Some(path) => format!("sqlite:{path}"),
        None => url.to_string(),
    }
}

/// `true`, `1` or `yes` (any case) enable a flag.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn flag_var(name: &str, default: bool) -> bool {
    non_blank_var(name).map_or(default, |value| parse_flag(&value))
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match non_blank_var(name) {
        Some(value) => value.trim().parse().map_err(|_| anyhow!("Invalid {}", name)),
        None => Ok(default),
    }
}
