use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::i18n::Language;
use crate::utils::datetime::to_db;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: String,
    pub is_admin: bool,
    pub is_banned: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_activity: String,
}

/// Profile fields Telegram sends with every update.
#[derive(Debug, Clone, Default)]
pub struct TelegramProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

const USER_COLUMNS: &str = "telegram_id, username, first_name, last_name, language_code, is_admin, is_banned, created_at, updated_at, last_activity";

impl User {
    pub fn language(&self) -> Language {
        Language::from_code(Some(&self.language_code))
    }

    /// Name to greet the user with.
    pub fn display_name(&self) -> String {
        self.first_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.username.as_deref())
            .unwrap_or("Usuario")
            .to_string()
    }

    /// Inserts the user or refreshes their profile and activity. The stored
    /// language, admin and ban flags are left alone on update; the language
    /// is only seeded from Telegram on first contact.
    pub async fn upsert_from_telegram(
        pool: &sqlx::SqlitePool,
        profile: &TelegramProfile,
        now: &DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let now = to_db(now);
        let language = Language::from_code(profile.language_code.as_deref());

        sqlx::query(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, language_code, created_at, updated_at, last_activity)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (telegram_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                updated_at = excluded.updated_at,
                last_activity = excluded.last_activity
            "#,
        )
        .bind(profile.telegram_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(language.code())
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find(pool, profile.telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Creates a bare row for a user the bot has not met yet, e.g. when an
    /// admin grants access by id. Existing rows are untouched.
    pub async fn ensure_exists(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
        now: &DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let now = to_db(now);
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (telegram_id, created_at, updated_at, last_activity)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(telegram_id)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(pool: &sqlx::SqlitePool, telegram_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?"))
            .bind(telegram_id)
            .fetch_optional(pool)
            .await
    }

    /// Stored language, or the default for users the bot has not met.
    pub async fn language_of(pool: &sqlx::SqlitePool, telegram_id: i64) -> Result<Language, sqlx::Error> {
        Ok(Self::find(pool, telegram_id)
            .await?
            .map(|user| user.language())
            .unwrap_or_default())
    }

    pub async fn touch_activity(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
        now: &DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_activity = ? WHERE telegram_id = ?")
            .bind(to_db(now))
            .bind(telegram_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_language(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
        language: Language,
        now: &DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET language_code = ?, updated_at = ? WHERE telegram_id = ?")
            .bind(language.code())
            .bind(to_db(now))
            .bind(telegram_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_banned(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
        banned: bool,
        now: &DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_banned = ?, updated_at = ? WHERE telegram_id = ?")
            .bind(banned)
            .bind(to_db(now))
            .bind(telegram_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest users first.
    pub async fn list(pool: &sqlx::SqlitePool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, telegram_id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}
