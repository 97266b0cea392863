#![allow(clippy::unwrap_used, clippy::panic)]

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pnp_subscription_bot::database::connection::DatabaseManager;
use pnp_subscription_bot::database::models::audit::{ACCESS_REVOKED, GRANT_ACCESS};
use pnp_subscription_bot::database::models::notification::EXPIRY_REMINDER;
use pnp_subscription_bot::database::models::user_setting::NOTIFICATIONS;
use pnp_subscription_bot::database::models::{AuditEntry, Notification, Subscription, User, UserSetting};
use pnp_subscription_bot::services::subscription::{parse_grant_args, ADMIN_GRANT_METHOD};
use pnp_subscription_bot::services::{AccessStatus, AdminStats, SubscriptionService};
use tempfile::{tempdir, TempDir};

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
}

#[tokio::test]
async fn test_grant_creates_user_subscription_and_audit() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    let request = parse_grant_args("555000111 Month")?;
    let subscription = service.grant(&request, 42, &t0).await?;

    assert_eq!(subscription.user_id, 555000111);
    assert_eq!(subscription.plan_type, "month");
    assert_eq!(subscription.status, "active");
    assert_eq!(subscription.payment_amount, Some(0.0));
    assert_eq!(subscription.payment_method.as_deref(), Some(ADMIN_GRANT_METHOD));
    assert_eq!(subscription.start_date, "2025-03-01T09:30:00Z");
    assert_eq!(subscription.end_date, "2025-03-31T09:30:00Z");

    let user = User::find(&db.pool, 555000111).await?.unwrap();
    assert!(!user.is_banned);

    let audit = AuditEntry::find_by_user(&db.pool, 555000111).await?;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, GRANT_ACCESS);
    assert_eq!(audit[0].admin_id, Some(42));
    assert_eq!(audit[0].details.as_deref(), Some("Plan: month, Days: 30"));

    Ok(())
}

#[tokio::test]
async fn test_grant_rejects_invalid_days() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());

    let mut request = parse_grant_args("7 week")?;
    request.days = 0;
    assert!(service.grant(&request, 1, &now()).await.is_err());
    assert!(User::find(&db.pool, 7).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_status_reports_days_left() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    assert_eq!(service.status(9, &t0).await?, AccessStatus::Inactive);

    service.grant(&parse_grant_args("9 week")?, 1, &t0).await?;
    service.grant(&parse_grant_args("9 halfyear 10")?, 1, &t0).await?;

    let later = t0 + Duration::days(2) + Duration::hours(3);
    match service.status(9, &later).await? {
        AccessStatus::Active {
            plan_type,
            end,
            days_left,
            ..
        } => {
            assert_eq!(plan_type, "halfyear");
            assert_eq!(end, t0 + Duration::days(10));
            assert_eq!(days_left, 7);
        }
        AccessStatus::Inactive => panic!("expected an active subscription"),
    }

    let after = t0 + Duration::days(10);
    assert!(!service.status(9, &after).await?.is_active());

    Ok(())
}

#[tokio::test]
async fn test_sweep_only_revokes_users_without_other_access() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    // user 1: single lapsed pass
    service.grant(&parse_grant_args("1 week")?, 99, &t0).await?;
    // user 2: lapsed pass but a longer one still running
    service.grant(&parse_grant_args("2 week")?, 99, &t0).await?;
    service.grant(&parse_grant_args("2 month")?, 99, &t0).await?;
    // user 3: two lapsed passes
    service.grant(&parse_grant_args("3 week 3")?, 99, &t0).await?;
    service.grant(&parse_grant_args("3 week 5")?, 99, &t0).await?;

    let sweep_at = t0 + Duration::days(8);
    let revoked = service.sweep_expired(&sweep_at).await?;
    let users: Vec<i64> = revoked.iter().map(|s| s.user_id).collect();
    assert_eq!(users, vec![1, 3]);

    let statuses: Vec<String> = Subscription::find_by_user(&db.pool, 2)
        .await?
        .into_iter()
        .map(|s| format!("{}:{}", s.plan_type, s.status))
        .collect();
    assert!(statuses.contains(&"week:expired".to_string()));
    assert!(statuses.contains(&"month:active".to_string()));

    assert!(service.sweep_expired(&sweep_at).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_admin_stats() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    assert_eq!(service.admin_stats(&t0).await?, AdminStats::default());

    service.grant(&parse_grant_args("1 week")?, 99, &t0).await?;
    service.grant(&parse_grant_args("2 month")?, 99, &t0).await?;
    service.grant(&parse_grant_args("3 month 2")?, 99, &t0).await?;
    User::ensure_exists(&db.pool, 4, &t0).await?;

    let stats = service.admin_stats(&(t0 + Duration::days(5))).await?;
    assert_eq!(
        stats,
        AdminStats {
            total_users: 4,
            active_subscriptions: 2,
            expiring_soon: 1,
            by_plan: vec![("month".to_string(), 1), ("week".to_string(), 1)],
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_sweep_audits_each_revocation() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    let lapsed = service.grant(&parse_grant_args("11 week")?, 99, &t0).await?;
    service.grant(&parse_grant_args("12 week")?, 99, &t0).await?;
    service.grant(&parse_grant_args("12 year")?, 99, &t0).await?;

    service.sweep_expired(&(t0 + Duration::days(8))).await?;

    let revoked: Vec<AuditEntry> = AuditEntry::find_by_user(&db.pool, 11)
        .await?
        .into_iter()
        .filter(|entry| entry.action == ACCESS_REVOKED)
        .collect();
    assert_eq!(revoked.len(), 1);
    assert_eq!(revoked[0].admin_id, None);
    assert_eq!(
        revoked[0].details.as_deref(),
        Some(format!("Plan: week, Subscription: {}", lapsed.id).as_str())
    );

    let kept = AuditEntry::find_by_user(&db.pool, 12).await?;
    assert!(kept.iter().all(|entry| entry.action != ACCESS_REVOKED));

    Ok(())
}

#[tokio::test]
async fn test_reminders_skip_passes_outlasted_by_another() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    service.grant(&parse_grant_args("5 week")?, 99, &t0).await?;
    service.grant(&parse_grant_args("5 year")?, 99, &t0).await?;
    let lone = service.grant(&parse_grant_args("6 week")?, 99, &t0).await?;

    let at = t0 + Duration::days(5);
    let batch = service.reminders_due(&at, Duration::days(3)).await?;
    let due: Vec<i64> = batch.due.iter().map(|s| s.id).collect();
    assert_eq!(due, vec![lone.id]);
    assert_eq!(batch.skipped, 1);

    // Skipping must not consume the reminder
    let week_of_5 = Subscription::find_by_user(&db.pool, 5)
        .await?
        .into_iter()
        .find(|s| s.plan_type == "week")
        .unwrap();
    assert!(!Notification::exists(&db.pool, week_of_5.id, EXPIRY_REMINDER).await?);

    Ok(())
}

#[tokio::test]
async fn test_reminders_respect_notification_setting() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    service.grant(&parse_grant_args("21 week")?, 99, &t0).await?;
    let opted_in = service.grant(&parse_grant_args("22 week")?, 99, &t0).await?;
    UserSetting::set(&db.pool, 21, NOTIFICATIONS, "false", &t0).await?;
    UserSetting::set(&db.pool, 22, NOTIFICATIONS, "true", &t0).await?;

    let batch = service.reminders_due(&(t0 + Duration::days(5)), Duration::days(3)).await?;
    let due: Vec<i64> = batch.due.iter().map(|s| s.user_id).collect();
    assert_eq!(due, vec![22]);
    assert_eq!(batch.due[0].id, opted_in.id);
    assert_eq!(batch.skipped, 1);

    Ok(())
}

#[tokio::test]
async fn test_reminder_is_sent_once_per_subscription() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let service = SubscriptionService::new(db.pool.clone());
    let t0 = now();

    let sub = service.grant(&parse_grant_args("31 week")?, 99, &t0).await?;

    let first_run = t0 + Duration::days(5);
    let batch = service.reminders_due(&first_run, Duration::days(3)).await?;
    assert_eq!(batch.due.len(), 1);
    assert!(service.record_reminder(sub.id, &first_run).await?);

    let next_day = first_run + Duration::days(1);
    let batch = service.reminders_due(&next_day, Duration::days(3)).await?;
    assert!(batch.due.is_empty());
    assert_eq!(batch.skipped, 1);
    assert!(!service.record_reminder(sub.id, &next_day).await?);
    assert_eq!(Notification::find_by_subscription(&db.pool, sub.id).await?.len(), 1);

    Ok(())
}
