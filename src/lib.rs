//! # PNP Television Subscription Bot
//!
//! A Telegram bot that sells time-boxed passes to a private channel.
//!
//! ## Features
//! - Onboarding with language choice, age gate and terms
//! - Plan catalogue with per-plan payment links
//! - Subscription tracking in SQLite, manual grants by admins
//! - Scheduled expiry sweep, expiry reminders, data retention and backups
//! - HTTP health endpoints for container platforms

/// Bot command handlers, callbacks and menus
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and maintenance
pub mod database;
/// Deployment helpers: branch gate, Cloud Run arguments, `.env` template
pub mod deploy;
/// Spanish and English texts
pub mod i18n;
/// Plan catalogue and payment links
pub mod plans;
/// Background and HTTP services
pub mod services;
/// Utility functions for datetime, validation, and formatting
pub mod utils;
