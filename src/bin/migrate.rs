use std::env;
use std::io;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::Utc;
use pnp_subscription_bot::config::database_url_from_env;
use pnp_subscription_bot::database::connection::{sqlite_file_path, DatabaseManager};
use pnp_subscription_bot::database::maintenance::{backup_database, cleanup_old_data, DEFAULT_RETENTION_DAYS};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");
    let argument = args.get(2).map(|s| s.as_str());

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "backup" => backup(argument).await,
        "cleanup" => cleanup(argument).await,
        "reset" => reset_database().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

async fn connect() -> Result<DatabaseManager> {
    let database_url = database_url_from_env();
    println!("📊 Database URL: {}", mask_url(&database_url));

    DatabaseManager::new(&database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))
}

async fn run_migrations() -> Result<()> {
    println!("🔧 PNP Television Bot - Database Migration Tool");
    println!("================================================");

    let db_manager = connect().await?;
    println!("🚀 Running database migrations...");

    match db_manager.run_migrations().await {
        Ok(_) => println!("✅ Migrations completed successfully!"),
        Err(e) => {
            eprintln!("❌ Migration failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");
    let db_manager = connect().await?;

    let tables = db_manager.list_tables().await?;
    println!("📋 Found tables:");
    for table in &tables {
        println!("  • {table}");
    }

    match db_manager.test_connection().await {
        Ok(()) => println!("✅ Database connection successful!"),
        Err(e) => {
            println!("⚠️  Database check failed: {e}");
            println!("💡 Try running 'migrate up' to create the schema");
        }
    }

    Ok(())
}

async fn backup(target: Option<&str>) -> Result<()> {
    let db_manager = connect().await?;
    let path = backup_database(&db_manager.pool, target.map(Path::new), &Utc::now()).await?;
    println!("💾 Backup written to {}", path.display());
    Ok(())
}

async fn cleanup(days: Option<&str>) -> Result<()> {
    let days = match days {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Invalid number of days: {raw}"))?,
        None => DEFAULT_RETENTION_DAYS,
    };

    let db_manager = connect().await?;
    let report = cleanup_old_data(&db_manager.pool, days, &Utc::now()).await?;
    println!(
        "🧹 Removed {} analytics events and {} audit entries older than {} days",
        report.analytics_deleted, report.audit_deleted, days
    );
    Ok(())
}

async fn reset_database() -> Result<()> {
    println!("⚠️  WARNING: This will delete ALL data in the database!");
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    let database_url = database_url_from_env();
    let db_path = sqlite_file_path(&database_url)
        .ok_or_else(|| anyhow!("Reset is only supported for file-backed SQLite databases"))?;

    for path in [db_path.to_string(), format!("{db_path}-wal"), format!("{db_path}-shm")] {
        if Path::new(&path).exists() {
            std::fs::remove_file(&path)?;
            println!("🗑️  Deleted {path}");
        }
    }

    println!("🔄 Recreating database schema...");
    run_migrations().await?;

    println!("✅ Database reset completed!");
    Ok(())
}

fn mask_url(url: &str) -> String {
    match sqlite_file_path(url).and_then(|path| Path::new(path).file_name()) {
        Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
        None => url.to_string(),
    }
}

fn print_help() {
    println!("🎬 PNP Television Bot - Database Tool");
    println!();
    println!("USAGE:");
    println!("    migrate [COMMAND] [ARG]");
    println!();
    println!("COMMANDS:");
    println!("    migrate, up      Run database migrations (default)");
    println!("    check            Check database connection and schema");
    println!("    backup [PATH]    Copy the database (default: backups/database_backup_<time>.db)");
    println!("    cleanup [DAYS]   Delete analytics and audit rows older than DAYS (default: 90)");
    println!("    reset            Reset database (SQLite only) - DESTRUCTIVE!");
    println!("    help             Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    DATABASE_URL     Database connection string (default: sqlite:./data/pnp_bot.db)");
    println!();
}
