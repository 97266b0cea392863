use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::utils::datetime::to_db;

pub const ONBOARDING_COMPLETE: &str = "onboarding_complete";
pub const NOTIFICATIONS: &str = "notifications";

#[derive(Debug, Clone, FromRow)]
pub struct UserSetting {
    pub user_id: i64,
    pub setting_key: String,
    pub setting_value: Option<String>,
    pub updated_at: String,
}

impl UserSetting {
    pub async fn get(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        key: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let value = sqlx::query_scalar::<_, Option<String>>(
            "SELECT setting_value FROM user_settings WHERE user_id = ? AND setting_key = ?",
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(pool)
        .await?;
        Ok(value.flatten())
    }

    pub async fn set(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        key: &str,
        value: &str,
        now: &DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, setting_key, setting_value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, setting_key) DO UPDATE SET
                setting_value = excluded.setting_value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .bind(to_db(now))
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_all(pool: &sqlx::SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserSetting>(
            "SELECT user_id, setting_key, setting_value, updated_at FROM user_settings WHERE user_id = ? ORDER BY setting_key",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn onboarding_complete(pool: &sqlx::SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        Ok(Self::get(pool, user_id, ONBOARDING_COMPLETE)
            .await?
            .map(|value| value == "true")
            .unwrap_or(false))
    }

    /// Expiry reminders are on unless the user switched them off.
    pub async fn notifications_enabled(pool: &sqlx::SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        Ok(Self::get(pool, user_id, NOTIFICATIONS)
            .await?
            .map(|value| value != "false")
            .unwrap_or(true))
    }
}
