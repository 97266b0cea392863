use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::database::models::audit::{ADMIN_ACTION, USER_BANNED};
use crate::utils::datetime::{file_stamp, to_db};

pub const DEFAULT_BACKUP_DIR: &str = "backups";
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub analytics_deleted: u64,
    pub audit_deleted: u64,
}

/// Deletes analytics and audit rows older than `days`, keeping ban and
/// admin actions forever, then compacts the file.
pub async fn cleanup_old_data(
    pool: &sqlx::SqlitePool,
    days: i64,
    now: &DateTime<Utc>,
) -> Result<CleanupReport> {
    if days < 0 {
        return Err(anyhow!("Retention days must not be negative, got {}", days));
    }
    let cutoff = to_db(&(*now - Duration::days(days)));

    let analytics = sqlx::query("DELETE FROM analytics_events WHERE created_at < ?")
        .bind(&cutoff)
        .execute(pool)
        .await?;

    let audit = sqlx::query("DELETE FROM audit_log WHERE created_at < ? AND action NOT IN (?, ?)")
        .bind(&cutoff)
        .bind(USER_BANNED)
        .bind(ADMIN_ACTION)
        .execute(pool)
        .await?;

    sqlx::query("VACUUM").execute(pool).await?;

    let report = CleanupReport {
        analytics_deleted: analytics.rows_affected(),
        audit_deleted: audit.rows_affected(),
    };
    info!(
        "Cleanup removed {} analytics events and {} audit entries older than {} days",
        report.analytics_deleted, report.audit_deleted, days
    );
    Ok(report)
}

pub fn default_backup_path(dir: &Path, now: &DateTime<Utc>) -> PathBuf {
    dir.join(format!("database_backup_{}.db", file_stamp(now)))
}

/// Writes a consistent copy of the live database with `VACUUM INTO`.
/// Without an explicit path the copy lands in `backups/`.
pub async fn backup_database(
    pool: &sqlx::SqlitePool,
    path: Option<&Path>,
    now: &DateTime<Utc>,
) -> Result<PathBuf> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => default_backup_path(Path::new(DEFAULT_BACKUP_DIR), now),
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if target.exists() {
        return Err(anyhow!("Backup target {} already exists", target.display()));
    }

    let target_str = target
        .to_str()
        .ok_or_else(|| anyhow!("Backup path is not valid UTF-8: {}", target.display()))?;

    sqlx::query("VACUUM INTO ?").bind(target_str).execute(pool).await?;

    info!("Database backed up to {}", target.display());
    Ok(target)
}
