use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::datetime::{from_db, to_db};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(format!("Unknown subscription status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan_type: String,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    pub payment_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub notes: Option<String>,
}

/// Fields needed to open a new subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription<'a> {
    pub user_id: i64,
    pub plan_type: &'a str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub payment_amount: f64,
    pub payment_method: &'a str,
}

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_type, status, start_date, end_date, payment_amount, payment_method, created_at, updated_at, notes";

impl Subscription {
    pub fn status(&self) -> Option<SubscriptionStatus> {
        self.status.parse().ok()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        from_db(&self.start_date)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        from_db(&self.end_date)
    }

    pub async fn create(
        pool: &sqlx::SqlitePool,
        new: NewSubscription<'_>,
        now: &DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let now = to_db(now);
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, plan_type, status, start_date, end_date, payment_amount, payment_method, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.plan_type)
        .bind(SubscriptionStatus::Active.as_str())
        .bind(to_db(&new.start))
        .bind(to_db(&new.end))
        .bind(new.payment_amount)
        .bind(new.payment_method)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &sqlx::SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(&format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The active subscription reaching furthest into the future.
    pub async fn find_active(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        now: &DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE user_id = ? AND status = 'active' AND end_date > ? \
             ORDER BY end_date DESC, id DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(to_db(now))
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user(pool: &sqlx::SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Active subscriptions ending after `now` but no later than `now + within`.
    pub async fn find_expiring(
        pool: &sqlx::SqlitePool,
        now: &DateTime<Utc>,
        within: Duration,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE status = 'active' AND end_date > ? AND end_date <= ? \
             ORDER BY end_date ASC, id ASC"
        ))
        .bind(to_db(now))
        .bind(to_db(&(*now + within)))
        .fetch_all(pool)
        .await
    }

    /// Flips every active subscription whose end date has passed to
    /// `expired` and returns the rows that changed.
    pub async fn expire_due(pool: &sqlx::SqlitePool, now: &DateTime<Utc>) -> Result<Vec<Self>, sqlx::Error> {
        let now = to_db(now);
        let mut tx = pool.begin().await?;

        let due = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE status = 'active' AND end_date <= ? ORDER BY id"
        ))
        .bind(&now)
        .fetch_all(&mut tx)
        .await?;

        sqlx::query("UPDATE subscriptions SET status = 'expired', updated_at = ? WHERE status = 'active' AND end_date <= ?")
            .bind(&now)
            .bind(&now)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;

        Ok(due
            .into_iter()
            .map(|mut sub| {
                sub.status = SubscriptionStatus::Expired.as_str().to_string();
                sub.updated_at = now.clone();
                sub
            })
            .collect())
    }

    pub async fn count_active(pool: &sqlx::SqlitePool, now: &DateTime<Utc>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE status = 'active' AND end_date > ?")
            .bind(to_db(now))
            .fetch_one(pool)
            .await
    }

    /// Active subscription counts grouped by plan type, alphabetical.
    pub async fn count_by_plan(
        pool: &sqlx::SqlitePool,
        now: &DateTime<Utc>,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT plan_type, COUNT(*) FROM subscriptions \
             WHERE status = 'active' AND end_date > ? GROUP BY plan_type ORDER BY plan_type",
        )
        .bind(to_db(now))
        .fetch_all(pool)
        .await
    }
}
