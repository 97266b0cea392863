//! # PNP Television Bot Entry Point
//!
//! Loads configuration, initialises logging and the database, checks the
//! bot token, then runs the dispatcher, the health server and the
//! scheduler side by side.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tracing::{error, info, warn};

use pnp_subscription_bot::bot::handlers::schema;
use pnp_subscription_bot::config::Config;
use pnp_subscription_bot::database::connection::DatabaseManager;
use pnp_subscription_bot::services::{HealthService, SchedulerService};
use pnp_subscription_bot::utils::logging::{init_tracing, log_system_event, log_system_warning};

const REQUIRED_DIRS: [&str; 3] = ["logs", "data", "backups"];

#[derive(Parser, Debug)]
#[command(name = "pnp-bot", version, about = "PNP Television subscription bot")]
struct Args {
    /// Override LOG_LEVEL (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long)]
    log_level: Option<String>,

    /// Check configuration and database, then exit
    #[arg(long)]
    validate_only: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level, Some(Path::new(&config.log_file)))?;
    info!("Starting PNP Television Bot v{}", env!("CARGO_PKG_VERSION"));

    for dir in REQUIRED_DIRS {
        std::fs::create_dir_all(dir)?;
    }

    let issues = config.validate();
    for issue in issues.iter().filter(|issue| !issue.is_error()) {
        log_system_warning("config", &issue.message);
    }
    let errors: Vec<&str> = issues
        .iter()
        .filter(|issue| issue.is_error())
        .map(|issue| issue.message.as_str())
        .collect();
    if !errors.is_empty() {
        error!("Configuration is invalid: {}", errors.join("; "));
        return Ok(ExitCode::FAILURE);
    }

    if config.debug_mode {
        info!("Configuration: {}", config.summary());
        match config.save_backup(Path::new("backups"), &Utc::now()) {
            Ok(path) => info!("Configuration snapshot saved to {}", path.display()),
            Err(e) => warn!("Could not save configuration snapshot: {:#}", e),
        }
    }

    info!("Initializing database...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.run_migrations().await?;
    db_manager.test_connection().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    if args.validate_only {
        info!("Validation finished, exiting (--validate-only)");
        return Ok(ExitCode::SUCCESS);
    }

    let config = Arc::new(config);
    let bot = Bot::new(&config.telegram_bot_token);

    if !verify_token(&bot, &config).await {
        error!("Could not reach Telegram after {} attempts", config.max_retries);
        return Ok(ExitCode::FAILURE);
    }

    let mut scheduler = if config.enable_scheduler {
        start_scheduler(bot.clone(), db_arc.pool.clone(), config.clone()).await
    } else {
        info!("Scheduler disabled by ENABLE_SCHEDULER");
        None
    };

    let health_service = HealthService::new(db_arc.clone());
    let http_port = config.http_port;
    let health_task = tokio::spawn(async move {
        if let Err(e) = health_service.serve(http_port).await {
            error!("Health server error: {:#}", e);
        }
    });

    let dispatcher_db = db_arc.as_ref().clone();
    let dispatcher_config = config.clone();
    let bot_task = tokio::spawn(async move {
        let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
        Dispatcher::builder(bot, schema())
            .dependencies(dptree::deps![dispatcher_db, dispatcher_config])
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    });

    log_system_event("bot_started", Some(&format!("health port {http_port}")));

    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                error!("Health task error: {}", e);
            }
        }
    }

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.stop().await {
            warn!("Error stopping scheduler: {:#}", e);
        }
    }

    log_system_event("bot_stopped", None);
    Ok(ExitCode::SUCCESS)
}

/// Calls `getMe` up to `MAX_RETRIES` times, `RETRY_DELAY` apart.
async fn verify_token(bot: &Bot, config: &Config) -> bool {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let attempts = config.max_retries.max(1);

    for attempt in 1..=attempts {
        match tokio::time::timeout(timeout, bot.get_me()).await {
            Ok(Ok(me)) => {
                info!(
                    "Connected to Telegram as @{}",
                    me.user.username.as_deref().unwrap_or("unknown")
                );
                return true;
            }
            Ok(Err(e)) => warn!("getMe failed (attempt {}/{}): {}", attempt, attempts, e),
            Err(_) => warn!("getMe timed out (attempt {}/{})", attempt, attempts),
        }

        if attempt < attempts {
            tokio::time::sleep(Duration::from_secs(config.retry_delay_secs)).await;
        }
    }
    false
}

async fn start_scheduler(bot: Bot, pool: sqlx::SqlitePool, config: Arc<Config>) -> Option<SchedulerService> {
    let mut scheduler = match SchedulerService::new(bot, pool, config).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            warn!("Failed to create scheduler, continuing without it: {:#}", e);
            return None;
        }
    };

    match scheduler.start().await {
        Ok(()) => Some(scheduler),
        Err(e) => {
            warn!("Failed to start scheduler, continuing without it: {:#}", e);
            None
        }
    }
}
