use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::database::models::audit::{ACCESS_REVOKED, GRANT_ACCESS};
use crate::database::models::notification::EXPIRY_REMINDER;
use crate::database::models::{AuditEntry, NewSubscription, Notification, Subscription, User, UserSetting};
use crate::plans::default_days_for;
use crate::utils::datetime::days_left;
use crate::utils::validation::{validate_grant_days, validate_user_id};

/// Payment method stored for subscriptions created by an admin.
pub const ADMIN_GRANT_METHOD: &str = "admin_grant";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStatus {
    Active {
        plan_type: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        days_left: i64,
    },
    Inactive,
}

impl AccessStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AccessStatus::Active { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRequest {
    pub user_id: i64,
    pub plan_type: String,
    pub days: i64,
}

/// Parses `<user_id> <plan_type> [days]`. Days default to the plan's own
/// length, or 30 for plan types outside the catalogue.
pub fn parse_grant_args(text: &str) -> Result<GrantRequest> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(anyhow!("Expected <user_id> <plan_type> [days]"));
    }

    let user_id: i64 = parts[0]
        .parse()
        .map_err(|_| anyhow!("Invalid user id: {}", parts[0]))?;
    validate_user_id(user_id)?;

    let plan_type = parts[1].to_lowercase();

    let days = match parts.get(2) {
        Some(raw) => raw.parse().map_err(|_| anyhow!("Invalid number of days: {}", raw))?,
        None => default_days_for(&plan_type),
    };
    validate_grant_days(days)?;

    Ok(GrantRequest {
        user_id,
        plan_type,
        days,
    })
}

/// Figures shown on the admin panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub total_users: i64,
    pub active_subscriptions: i64,
    pub expiring_soon: i64,
    pub by_plan: Vec<(String, i64)>,
}

/// Window used for "expiring soon" on the admin panel.
pub const EXPIRING_SOON_DAYS: i64 = 3;

/// Outcome of picking which expiring subscriptions get a reminder.
#[derive(Debug, Clone, Default)]
pub struct ReminderBatch {
    pub due: Vec<Subscription>,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct SubscriptionService {
    pool: sqlx::SqlitePool,
}

impl SubscriptionService {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn status(&self, user_id: i64, now: &DateTime<Utc>) -> Result<AccessStatus, sqlx::Error> {
        let Some(sub) = Subscription::find_active(&self.pool, user_id, now).await? else {
            return Ok(AccessStatus::Inactive);
        };

        match (sub.start(), sub.end()) {
            (Some(start), Some(end)) => Ok(AccessStatus::Active {
                days_left: days_left(&end, now),
                plan_type: sub.plan_type,
                start,
                end,
            }),
            _ => {
                tracing::warn!("Subscription {} has unreadable dates", sub.id);
                Ok(AccessStatus::Inactive)
            }
        }
    }

    /// Opens a free subscription on behalf of an admin and audits it.
    pub async fn grant(
        &self,
        request: &GrantRequest,
        admin_id: i64,
        now: &DateTime<Utc>,
    ) -> Result<Subscription> {
        validate_user_id(request.user_id)?;
        validate_grant_days(request.days)?;

        User::ensure_exists(&self.pool, request.user_id, now).await?;

        let subscription = Subscription::create(
            &self.pool,
            NewSubscription {
                user_id: request.user_id,
                plan_type: &request.plan_type,
                start: *now,
                end: *now + Duration::days(request.days),
                payment_amount: 0.0,
                payment_method: ADMIN_GRANT_METHOD,
            },
            now,
        )
        .await?;

        let details = format!("Plan: {}, Days: {}", request.plan_type, request.days);
        AuditEntry::record(
            &self.pool,
            Some(request.user_id),
            Some(admin_id),
            GRANT_ACCESS,
            Some(&details),
            now,
        )
        .await?;

        info!(
            "Admin {} granted {} ({} days) to user {}",
            admin_id, request.plan_type, request.days, request.user_id
        );
        Ok(subscription)
    }

    pub async fn admin_stats(&self, now: &DateTime<Utc>) -> Result<AdminStats, sqlx::Error> {
        let expiring = Subscription::find_expiring(&self.pool, now, Duration::days(EXPIRING_SOON_DAYS)).await?;

        Ok(AdminStats {
            total_users: User::count(&self.pool).await?,
            active_subscriptions: Subscription::count_active(&self.pool, now).await?,
            expiring_soon: i64::try_from(expiring.len()).unwrap_or(i64::MAX),
            by_plan: Subscription::count_by_plan(&self.pool, now).await?,
        })
    }

    /// Expires every lapsed subscription and returns those whose owner is
    /// left without any other active one, i.e. users to remove from the
    /// channel. A user appears at most once and each revocation is audited.
    pub async fn sweep_expired(&self, now: &DateTime<Utc>) -> Result<Vec<Subscription>, sqlx::Error> {
        let expired = Subscription::expire_due(&self.pool, now).await?;

        let mut revoked: Vec<Subscription> = Vec::new();
        for sub in expired {
            if revoked.iter().any(|r| r.user_id == sub.user_id) {
                continue;
            }
            if Subscription::find_active(&self.pool, sub.user_id, now).await?.is_none() {
                revoked.push(sub);
            }
        }

        for sub in &revoked {
            let details = format!("Plan: {}, Subscription: {}", sub.plan_type, sub.id);
            if let Err(e) =
                AuditEntry::record(&self.pool, Some(sub.user_id), None, ACCESS_REVOKED, Some(&details), now).await
            {
                warn!("Failed to audit revocation for user {}: {}", sub.user_id, e);
            }
        }

        if !revoked.is_empty() {
            info!("{} users lost channel access", revoked.len());
        }
        Ok(revoked)
    }

    /// Active subscriptions ending within `within` that should get the
    /// expiry reminder. Skipped: subscriptions already reminded, users who
    /// switched notifications off, and subscriptions outlasted by another
    /// active one of the same user.
    pub async fn reminders_due(&self, now: &DateTime<Utc>, within: Duration) -> Result<ReminderBatch, sqlx::Error> {
        let expiring = Subscription::find_expiring(&self.pool, now, within).await?;
        let mut batch = ReminderBatch::default();

        for sub in expiring {
            if sub.end().is_none() {
                warn!("Subscription {} has an unreadable end date", sub.id);
                batch.skipped += 1;
                continue;
            }

            if Notification::exists(&self.pool, sub.id, EXPIRY_REMINDER).await?
                || !UserSetting::notifications_enabled(&self.pool, sub.user_id).await?
            {
                batch.skipped += 1;
                continue;
            }

            // Stored dates share one format, so string order is time order
            let outlasted = Subscription::find_active(&self.pool, sub.user_id, now)
                .await?
                .is_some_and(|latest| latest.end_date > sub.end_date);
            if outlasted {
                batch.skipped += 1;
                continue;
            }

            batch.due.push(sub);
        }

        Ok(batch)
    }

    /// Marks the expiry reminder as sent. Returns false when it already was.
    pub async fn record_reminder(&self, subscription_id: i64, now: &DateTime<Utc>) -> Result<bool, sqlx::Error> {
        Notification::record(&self.pool, subscription_id, EXPIRY_REMINDER, now).await
    }
}
