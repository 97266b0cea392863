use chrono::{DateTime, Utc};

use crate::utils::datetime::to_db;

/// Runtime-editable key/value settings shared by the whole bot.
pub struct BotSetting;

impl BotSetting {
    pub async fn get(pool: &sqlx::SqlitePool, key: &str, default: &str) -> Result<String, sqlx::Error> {
        let value = sqlx::query_scalar::<_, Option<String>>(
            "SELECT setting_value FROM bot_settings WHERE setting_key = ?",
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(value.flatten().unwrap_or_else(|| default.to_string()))
    }

    pub async fn set(
        pool: &sqlx::SqlitePool,
        key: &str,
        value: &str,
        description: Option<&str>,
        now: &DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO bot_settings (setting_key, setting_value, description, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (setting_key) DO UPDATE SET
                setting_value = excluded.setting_value,
                description = COALESCE(excluded.description, bot_settings.description),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(to_db(now))
        .execute(pool)
        .await?;
        Ok(())
    }
}
