#![allow(clippy::unwrap_used)]

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pnp_subscription_bot::database::maintenance::{backup_database, cleanup_old_data};
use pnp_subscription_bot::database::models::audit::{ADMIN_ACTION, GRANT_ACCESS, USER_BANNED};
use pnp_subscription_bot::database::models::notification::EXPIRY_REMINDER;
use pnp_subscription_bot::database::models::*;
use pnp_subscription_bot::database::{connection::DatabaseManager, models::user_setting::NOTIFICATIONS};
use pnp_subscription_bot::i18n::Language;
use serde_json::json;
use tempfile::{tempdir, TempDir};

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("nested").join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn profile(telegram_id: i64, first_name: &str, language_code: Option<&str>) -> TelegramProfile {
    TelegramProfile {
        telegram_id,
        username: Some(format!("user{telegram_id}")),
        first_name: Some(first_name.to_string()),
        last_name: None,
        language_code: language_code.map(str::to_string),
    }
}

async fn subscribe(db: &DatabaseManager, user_id: i64, plan_type: &str, start: DateTime<Utc>, days: i64) -> Result<Subscription> {
    User::ensure_exists(&db.pool, user_id, &start).await?;
    Ok(Subscription::create(
        &db.pool,
        NewSubscription {
            user_id,
            plan_type,
            start,
            end: start + Duration::days(days),
            payment_amount: 24.99,
            payment_method: "card",
        },
        &start,
    )
    .await?)
}

#[tokio::test]
async fn test_connection_self_test() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    db.test_connection().await?;
    let tables = db.list_tables().await?;
    for table in ["users", "subscriptions", "payments", "notifications", "audit_log", "analytics_events"] {
        assert!(tables.iter().any(|t| t == table), "{table} missing");
    }

    Ok(())
}

#[tokio::test]
async fn test_self_test_fails_before_migrations() -> Result<()> {
    let temp_dir = tempdir()?;
    let database_url = format!("sqlite:{}", temp_dir.path().join("empty.db").display());
    let db = DatabaseManager::new(&database_url).await?;

    let error = db.test_connection().await.unwrap_err().to_string();
    assert!(error.contains("users"));

    Ok(())
}

#[tokio::test]
async fn test_user_upsert_keeps_stored_language_and_flags() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();

    let user = User::upsert_from_telegram(&db.pool, &profile(1001, "Ana", Some("en-US")), &t0).await?;
    assert_eq!(user.language(), Language::En);
    assert_eq!(user.display_name(), "Ana");
    assert!(!user.is_banned);

    User::set_language(&db.pool, 1001, Language::Es, &t0).await?;
    User::set_banned(&db.pool, 1001, true, &t0).await?;

    let t1 = t0 + Duration::hours(1);
    let user = User::upsert_from_telegram(&db.pool, &profile(1001, "Ana María", Some("en")), &t1).await?;
    assert_eq!(user.first_name.as_deref(), Some("Ana María"));
    assert_eq!(user.language(), Language::Es);
    assert!(user.is_banned);
    assert_eq!(user.last_activity, "2025-06-15T13:00:00Z");
    assert_eq!(user.created_at, "2025-06-15T12:00:00Z");

    Ok(())
}

#[tokio::test]
async fn test_user_listing_and_counting() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();

    for (i, id) in [10_i64, 20, 30].into_iter().enumerate() {
        let at = t0 + Duration::minutes(i as i64);
        User::upsert_from_telegram(&db.pool, &profile(id, "Name", None), &at).await?;
    }
    User::ensure_exists(&db.pool, 10, &t0).await?;

    assert_eq!(User::count(&db.pool).await?, 3);
    let page: Vec<i64> = User::list(&db.pool, 2, 0).await?.into_iter().map(|u| u.telegram_id).collect();
    assert_eq!(page, vec![30, 20]);
    let rest: Vec<i64> = User::list(&db.pool, 2, 2).await?.into_iter().map(|u| u.telegram_id).collect();
    assert_eq!(rest, vec![10]);

    assert!(User::touch_activity(&db.pool, 20, &(t0 + Duration::days(1))).await?);
    assert!(!User::touch_activity(&db.pool, 99, &t0).await?);
    assert_eq!(User::language_of(&db.pool, 99).await?, Language::Es);

    Ok(())
}

#[tokio::test]
async fn test_user_settings() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();
    User::ensure_exists(&db.pool, 7, &t0).await?;

    assert!(!UserSetting::onboarding_complete(&db.pool, 7).await?);
    assert!(UserSetting::notifications_enabled(&db.pool, 7).await?);

    UserSetting::set(&db.pool, 7, "onboarding_complete", "true", &t0).await?;
    UserSetting::set(&db.pool, 7, NOTIFICATIONS, "true", &t0).await?;
    UserSetting::set(&db.pool, 7, NOTIFICATIONS, "false", &t0).await?;

    assert!(UserSetting::onboarding_complete(&db.pool, 7).await?);
    assert!(!UserSetting::notifications_enabled(&db.pool, 7).await?);
    assert_eq!(UserSetting::get(&db.pool, 7, "missing").await?, None);
    assert_eq!(UserSetting::find_all(&db.pool, 7).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_settings_require_existing_user() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let result = UserSetting::set(&db.pool, 404, NOTIFICATIONS, "false", &now()).await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_find_active_prefers_latest_end() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();

    let short = subscribe(&db, 5, "week", t0, 7).await?;
    let long = subscribe(&db, 5, "month", t0, 30).await?;
    subscribe(&db, 5, "year", t0 - Duration::days(400), 365).await?;

    assert_eq!(short.status(), Some(SubscriptionStatus::Active));
    let active = Subscription::find_active(&db.pool, 5, &t0).await?.unwrap();
    assert_eq!(active.id, long.id);
    assert_eq!(active.payment_method.as_deref(), Some("card"));

    let later = t0 + Duration::days(31);
    assert!(Subscription::find_active(&db.pool, 5, &later).await?.is_none());
    assert_eq!(Subscription::find_by_user(&db.pool, 5).await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_find_expiring_window() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();

    let soon = subscribe(&db, 1, "week", t0 - Duration::days(5), 7).await?;
    subscribe(&db, 2, "month", t0, 30).await?;
    subscribe(&db, 3, "week", t0 - Duration::days(10), 7).await?;

    let expiring = Subscription::find_expiring(&db.pool, &t0, Duration::days(3)).await?;
    let ids: Vec<i64> = expiring.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![soon.id]);

    Ok(())
}

#[tokio::test]
async fn test_expire_due_flips_only_lapsed_rows() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();

    let lapsed = subscribe(&db, 1, "week", t0 - Duration::days(8), 7).await?;
    let exact = subscribe(&db, 2, "week", t0 - Duration::days(7), 7).await?;
    let current = subscribe(&db, 3, "month", t0, 30).await?;

    let expired = Subscription::expire_due(&db.pool, &t0).await?;
    let ids: Vec<i64> = expired.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![lapsed.id, exact.id]);
    assert!(expired.iter().all(|s| s.status() == Some(SubscriptionStatus::Expired)));

    let stored = Subscription::find_by_id(&db.pool, lapsed.id).await?.unwrap();
    assert_eq!(stored.status, "expired");
    let untouched = Subscription::find_by_id(&db.pool, current.id).await?.unwrap();
    assert_eq!(untouched.status, "active");

    assert!(Subscription::expire_due(&db.pool, &t0).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_counts_by_plan() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();

    subscribe(&db, 1, "month", t0, 30).await?;
    subscribe(&db, 2, "month", t0, 30).await?;
    subscribe(&db, 3, "week", t0, 7).await?;
    subscribe(&db, 4, "year", t0 - Duration::days(400), 365).await?;

    assert_eq!(Subscription::count_active(&db.pool, &t0).await?, 3);
    assert_eq!(
        Subscription::count_by_plan(&db.pool, &t0).await?,
        vec![("month".to_string(), 2), ("week".to_string(), 1)]
    );

    Ok(())
}

#[tokio::test]
async fn test_notifications_are_recorded_once() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();
    let sub = subscribe(&db, 1, "week", t0, 7).await?;

    assert!(!Notification::exists(&db.pool, sub.id, EXPIRY_REMINDER).await?);
    assert!(Notification::record(&db.pool, sub.id, EXPIRY_REMINDER, &t0).await?);
    assert!(!Notification::record(&db.pool, sub.id, EXPIRY_REMINDER, &t0).await?);
    assert!(Notification::exists(&db.pool, sub.id, EXPIRY_REMINDER).await?);
    assert_eq!(Notification::find_by_subscription(&db.pool, sub.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_bot_settings() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();

    assert_eq!(BotSetting::get(&db.pool, "maintenance", "off").await?, "off");
    BotSetting::set(&db.pool, "maintenance", "on", Some("Pause new signups"), &t0).await?;
    BotSetting::set(&db.pool, "maintenance", "off", None, &t0).await?;
    assert_eq!(BotSetting::get(&db.pool, "maintenance", "on").await?, "off");

    let description: Option<String> =
        sqlx::query_scalar("SELECT description FROM bot_settings WHERE setting_key = 'maintenance'")
            .fetch_one(&db.pool)
            .await?;
    assert_eq!(description.as_deref(), Some("Pause new signups"));

    Ok(())
}

#[tokio::test]
async fn test_analytics_respects_switch() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();
    let data = json!({ "plan": "month" });

    assert!(!AnalyticsEvent::record(&db.pool, false, Some(1), "plan_selected", Some(&data), &t0).await?);
    assert!(AnalyticsEvent::record(&db.pool, true, Some(1), "plan_selected", Some(&data), &t0).await?);
    assert!(AnalyticsEvent::record(&db.pool, true, None, "plan_selected", None, &t0).await?);

    assert_eq!(AnalyticsEvent::count_by_type(&db.pool, "plan_selected").await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_cleanup_keeps_recent_and_protected_rows() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let t0 = now();
    let old = t0 - Duration::days(120);

    AnalyticsEvent::record(&db.pool, true, Some(1), "start_command", None, &old).await?;
    AnalyticsEvent::record(&db.pool, true, Some(1), "start_command", None, &t0).await?;
    AuditEntry::record(&db.pool, Some(1), Some(9), GRANT_ACCESS, None, &old).await?;
    AuditEntry::record(&db.pool, Some(1), Some(9), USER_BANNED, None, &old).await?;
    AuditEntry::record(&db.pool, Some(1), Some(9), ADMIN_ACTION, None, &old).await?;
    AuditEntry::record(&db.pool, Some(1), Some(9), GRANT_ACCESS, None, &t0).await?;

    let report = cleanup_old_data(&db.pool, 90, &t0).await?;
    assert_eq!(report.analytics_deleted, 1);
    assert_eq!(report.audit_deleted, 1);

    let actions: Vec<String> = AuditEntry::find_by_user(&db.pool, 1).await?.into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![USER_BANNED, ADMIN_ACTION, GRANT_ACCESS]);
    assert_eq!(AnalyticsEvent::count_by_type(&db.pool, "start_command").await?, 1);

    assert!(cleanup_old_data(&db.pool, -1, &t0).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_backup_writes_a_readable_copy() -> Result<()> {
    let (db, temp_dir) = setup_test_db().await?;
    let t0 = now();
    subscribe(&db, 1, "month", t0, 30).await?;

    let target = temp_dir.path().join("backups").join("copy.db");
    let written = backup_database(&db.pool, Some(&target), &t0).await?;
    assert_eq!(written, target);
    assert!(target.exists());

    let copy = DatabaseManager::new(&format!("sqlite:{}", target.display())).await?;
    assert_eq!(Subscription::count_active(&copy.pool, &t0).await?, 1);

    assert!(backup_database(&db.pool, Some(&target), &t0).await.is_err());

    Ok(())
}
