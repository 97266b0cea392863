use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, UserId};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::bot::channel_recipient;
use crate::config::Config;
use crate::database::maintenance::{backup_database, cleanup_old_data, DEFAULT_RETENTION_DAYS};
use crate::database::models::User;
use crate::i18n::{fill, Language, Text};
use crate::services::subscription::SubscriptionService;
use crate::utils::datetime::{days_left, format_date};
use crate::utils::markdown::escape_markdown;

/// Every 15 minutes.
pub const EXPIRY_SWEEP_CRON: &str = "0 */15 * * * *";
/// Daily at 10:00 UTC.
pub const EXPIRY_REMINDER_CRON: &str = "0 0 10 * * *";
/// Daily at 03:00 UTC.
pub const CLEANUP_CRON: &str = "0 0 3 * * *";
/// Daily at 03:30 UTC.
pub const BACKUP_CRON: &str = "0 30 3 * * *";

/// How far ahead the reminder job looks.
pub const REMINDER_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub revoked: usize,
    pub removed_from_channel: usize,
    pub notified: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    pub skipped: usize,
}

/// Shared state every job closure clones.
#[derive(Clone)]
struct JobContext {
    bot: Bot,
    pool: sqlx::SqlitePool,
    config: Arc<Config>,
}

pub struct SchedulerService {
    ctx: JobContext,
    scheduler: JobScheduler,
}

impl SchedulerService {
    pub async fn new(bot: Bot, pool: sqlx::SqlitePool, config: Arc<Config>) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            ctx: JobContext { bot, pool, config },
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let ctx = self.ctx.clone();
        let sweep_job = Job::new_async(EXPIRY_SWEEP_CRON, move |_uuid, _l| {
            let ctx = ctx.clone();
            Box::pin(async move {
                if let Err(e) = run_expiry_sweep(&ctx, Utc::now()).await {
                    error!("Expiry sweep failed: {}", e);
                }
            })
        })?;

        let ctx = self.ctx.clone();
        let reminder_job = Job::new_async(EXPIRY_REMINDER_CRON, move |_uuid, _l| {
            let ctx = ctx.clone();
            Box::pin(async move {
                if let Err(e) = send_expiry_reminders(&ctx, Utc::now()).await {
                    error!("Failed to send expiry reminders: {}", e);
                }
            })
        })?;

        let pool = self.ctx.pool.clone();
        let cleanup_job = Job::new_async(CLEANUP_CRON, move |_uuid, _l| {
            let pool = pool.clone();
            Box::pin(async move {
                if let Err(e) = cleanup_old_data(&pool, DEFAULT_RETENTION_DAYS, &Utc::now()).await {
                    error!("Data cleanup failed: {}", e);
                }
            })
        })?;

        let pool = self.ctx.pool.clone();
        let backup_job = Job::new_async(BACKUP_CRON, move |_uuid, _l| {
            let pool = pool.clone();
            Box::pin(async move {
                if let Err(e) = backup_database(&pool, None, &Utc::now()).await {
                    error!("Database backup failed: {}", e);
                }
            })
        })?;

        self.scheduler.add(sweep_job).await?;
        self.scheduler.add(reminder_job).await?;
        self.scheduler.add(cleanup_job).await?;
        self.scheduler.add(backup_job).await?;
        self.scheduler.start().await?;

        info!("Scheduler started: expiry sweep every 15 min, reminders 10:00 UTC, cleanup 03:00 UTC, backup 03:30 UTC");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        info!("Scheduler stopped");
        Ok(())
    }

    pub async fn run_expiry_sweep_now(&self) -> Result<SweepReport> {
        run_expiry_sweep(&self.ctx, Utc::now()).await
    }

    pub async fn send_expiry_reminders_now(&self) -> Result<ReminderReport> {
        send_expiry_reminders(&self.ctx, Utc::now()).await
    }
}

async fn run_expiry_sweep(ctx: &JobContext, now: DateTime<Utc>) -> Result<SweepReport> {
    let service = SubscriptionService::new(ctx.pool.clone());
    let revoked = service.sweep_expired(&now).await?;

    let mut report = SweepReport {
        revoked: revoked.len(),
        ..SweepReport::default()
    };

    for sub in &revoked {
        if remove_from_channel(ctx, sub.user_id).await {
            report.removed_from_channel += 1;
        }

        let lang = user_language(&ctx.pool, sub.user_id).await;
        if send_user_text(&ctx.bot, sub.user_id, Text::SubscriptionExpired.get(lang)).await {
            report.notified += 1;
        }
    }

    if report.revoked > 0 {
        info!(
            "Expiry sweep: {} revoked, {} removed from channel, {} notified",
            report.revoked, report.removed_from_channel, report.notified
        );
    }
    Ok(report)
}

async fn send_expiry_reminders(ctx: &JobContext, now: DateTime<Utc>) -> Result<ReminderReport> {
    let service = SubscriptionService::new(ctx.pool.clone());
    let batch = service.reminders_due(&now, Duration::days(REMINDER_WINDOW_DAYS)).await?;
    let mut report = ReminderReport {
        skipped: batch.skipped,
        ..ReminderReport::default()
    };

    for sub in batch.due {
        let Some(end) = sub.end() else {
            report.skipped += 1;
            continue;
        };

        let lang = user_language(&ctx.pool, sub.user_id).await;
        let text = expiry_reminder_text(lang, &end, &now);
        if send_user_text(&ctx.bot, sub.user_id, &text).await {
            service.record_reminder(sub.id, &now).await?;
            report.sent += 1;
        } else {
            report.skipped += 1;
        }
    }

    info!("Expiry reminders: {} sent, {} skipped", report.sent, report.skipped);
    Ok(report)
}

pub fn expiry_reminder_text(lang: Language, end: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    fill(
        Text::ExpiryReminder.get(lang),
        &[
            ("days_left", &days_left(end, now).to_string()),
            ("expiry_date", &format_date(end)),
        ],
    )
}

/// Kicks the user and lifts the ban straight away so they can rejoin after
/// paying again.
async fn remove_from_channel(ctx: &JobContext, user_id: i64) -> bool {
    let Ok(telegram_id) = u64::try_from(user_id) else {
        warn!("Cannot remove user with invalid id {}", user_id);
        return false;
    };
    let channel = channel_recipient(&ctx.config.channel_id);

    if let Err(e) = ctx.bot.ban_chat_member(channel.clone(), UserId(telegram_id)).await {
        warn!("Failed to remove user {} from {}: {}", user_id, ctx.config.channel_id, e);
        return false;
    }
    if let Err(e) = ctx.bot.unban_chat_member(channel, UserId(telegram_id)).await {
        warn!("Failed to lift ban for user {} in {}: {}", user_id, ctx.config.channel_id, e);
    }
    true
}

async fn user_language(pool: &sqlx::SqlitePool, user_id: i64) -> Language {
    match User::language_of(pool, user_id).await {
        Ok(lang) => lang,
        Err(e) => {
            warn!("Failed to load language for user {}: {}", user_id, e);
            Language::default()
        }
    }
}

async fn send_user_text(bot: &Bot, user_id: i64, text: &str) -> bool {
    match bot
        .send_message(ChatId(user_id), escape_markdown(text))
        .parse_mode(ParseMode::MarkdownV2)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to message user {}: {}", user_id, e);
            false
        }
    }
}
