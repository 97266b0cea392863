pub mod health;
pub mod scheduler;
pub mod subscription;

pub use health::HealthService;
pub use scheduler::SchedulerService;
pub use subscription::{AccessStatus, AdminStats, ReminderBatch, SubscriptionService};
