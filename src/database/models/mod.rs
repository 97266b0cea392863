pub mod analytics;
pub mod audit;
pub mod bot_setting;
pub mod notification;
pub mod subscription;
pub mod user;
pub mod user_setting;

pub use analytics::AnalyticsEvent;
pub use audit::AuditEntry;
pub use bot_setting::BotSetting;
pub use notification::Notification;
pub use subscription::{NewSubscription, Subscription, SubscriptionStatus};
pub use user::{TelegramProfile, User};
pub use user_setting::UserSetting;
