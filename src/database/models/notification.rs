use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::utils::datetime::to_db;

/// Kind recorded for the reminder sent three days before expiry.
pub const EXPIRY_REMINDER: &str = "expiry_3d";

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: i64,
    pub subscription_id: i64,
    pub kind: String,
    pub sent_at: String,
}

impl Notification {
    pub async fn exists(
        pool: &sqlx::SqlitePool,
        subscription_id: i64,
        kind: &str,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE subscription_id = ? AND kind = ?",
        )
        .bind(subscription_id)
        .bind(kind)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    /// Returns false when the notification had already been recorded.
    pub async fn record(
        pool: &sqlx::SqlitePool,
        subscription_id: i64,
        kind: &str,
        now: &DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO notifications (subscription_id, kind, sent_at) VALUES (?, ?, ?)",
        )
        .bind(subscription_id)
        .bind(kind)
        .bind(to_db(now))
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_subscription(
        pool: &sqlx::SqlitePool,
        subscription_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            "SELECT id, subscription_id, kind, sent_at FROM notifications WHERE subscription_id = ? ORDER BY sent_at",
        )
        .bind(subscription_id)
        .fetch_all(pool)
        .await
    }
}
