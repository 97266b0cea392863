use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::utils::datetime::to_db;

pub const START_COMMAND: &str = "start_command";
pub const PLAN_SELECTED: &str = "plan_selected";

pub struct AnalyticsEvent;

impl AnalyticsEvent {
    /// Stores one event. Does nothing and returns `Ok(false)` when
    /// analytics are switched off.
    pub async fn record(
        pool: &sqlx::SqlitePool,
        enabled: bool,
        user_id: Option<i64>,
        event_type: &str,
        data: Option<&Value>,
        now: &DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        if !enabled {
            return Ok(false);
        }

        sqlx::query("INSERT INTO analytics_events (user_id, event_type, event_data, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(event_type)
            .bind(data.map(Value::to_string))
            .bind(to_db(now))
            .execute(pool)
            .await?;

        Ok(true)
    }

    pub async fn count_by_type(pool: &sqlx::SqlitePool, event_type: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM analytics_events WHERE event_type = ?")
            .bind(event_type)
            .fetch_one(pool)
            .await
    }
}
