mod settings;
mod stats;
mod task;
mod wallet;

pub use settings::ReminderSettings;
pub use stats::{Feature, FeatureCounts, UsageReport, UsageStats};
pub use task::{Task, TaskDraft, TaskId, TaskType};
pub use wallet::{ProviderKind, WalletKind, WalletRecord, WalletState};
