use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::utils::datetime::to_db;

pub const GRANT_ACCESS: &str = "grant_access";
pub const USER_BANNED: &str = "user_banned";
pub const ADMIN_ACTION: &str = "admin_action";
pub const ACCESS_REVOKED: &str = "access_revoked";

#[derive(Debug, Clone, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub action: String,
    pub details: Option<String>,
    pub created_at: String,
}

impl AuditEntry {
    pub async fn record(
        pool: &sqlx::SqlitePool,
        user_id: Option<i64>,
        admin_id: Option<i64>,
        action: &str,
        details: Option<&str>,
        now: &DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO audit_log (user_id, admin_id, action, details, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(admin_id)
        .bind(action)
        .bind(details)
        .bind(to_db(now))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_user(pool: &sqlx::SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            "SELECT id, user_id, admin_id, action, details, created_at FROM audit_log WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
