use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Search,
    Filter,
    Sort,
    EmailReminders,
    WalletConnected,
    TasksWithReminders,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Search => "search_used",
            Feature::Filter => "filter_used",
            Feature::Sort => "sort_used",
            Feature::EmailReminders => "email_reminders_used",
            Feature::WalletConnected => "wallet_connected",
            Feature::TasksWithReminders => "tasks_with_reminders",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts {
    #[serde(default)]
    pub search_used: u64,
    #[serde(default)]
    pub filter_used: u64,
    #[serde(default)]
    pub sort_used: u64,
    #[serde(default)]
    pub email_reminders_used: u64,
    #[serde(default)]
    pub wallet_connected: u64,
    #[serde(default)]
    pub tasks_with_reminders: u64,
}

impl FeatureCounts {
    fn counter_mut(&mut self, feature: Feature) -> &mut u64 {
        match feature {
            Feature::Search => &mut self.search_used,
            Feature::Filter => &mut self.filter_used,
            Feature::Sort => &mut self.sort_used,
            Feature::EmailReminders => &mut self.email_reminders_used,
            Feature::WalletConnected => &mut self.wallet_connected,
            Feature::TasksWithReminders => &mut self.tasks_with_reminders,
        }
    }

    pub fn get(&self, feature: Feature) -> u64 {
        match feature {
            Feature::Search => self.search_used,
            Feature::Filter => self.filter_used,
            Feature::Sort => self.sort_used,
            Feature::EmailReminders => self.email_reminders_used,
            Feature::WalletConnected => self.wallet_connected,
            Feature::TasksWithReminders => self.tasks_with_reminders,
        }
    }
}

/// Append-only usage counters. Nothing here is ever decremented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub total_visits: u64,
    #[serde(default)]
    pub first_visit: Option<String>,
    #[serde(default)]
    pub last_visit: Option<String>,
    #[serde(default)]
    pub total_tasks_created: u64,
    #[serde(default)]
    pub total_tasks_completed: u64,
    #[serde(default)]
    pub total_times_wallet_connected: u64,
    #[serde(default)]
    pub features: FeatureCounts,
}

impl UsageStats {
    pub fn record_session(&mut self, timestamp: &str) {
        self.total_sessions += 1;
        self.total_visits += 1;
        if self.first_visit.is_none() {
            self.first_visit = Some(timestamp.to_string());
        }
        self.last_visit = Some(timestamp.to_string());
    }

    pub fn track_feature(&mut self, feature: Feature) {
        *self.features.counter_mut(feature) += 1;
    }

    pub fn track_task_created(&mut self) {
        self.total_tasks_created += 1;
    }

    pub fn track_task_completed(&mut self) {
        self.total_tasks_completed += 1;
    }

    pub fn track_wallet_connection(&mut self) {
        self.total_times_wallet_connected += 1;
        self.track_feature(Feature::WalletConnected);
    }

    pub fn report(&self) -> UsageReport {
        let task_completion_rate = if self.total_tasks_created > 0 {
            format!(
                "{:.2}%",
                self.total_tasks_completed as f64 / self.total_tasks_created as f64 * 100.0
            )
        } else {
            "0%".to_string()
        };
        let average_tasks_per_session = if self.total_sessions > 0 {
            format!(
                "{:.2}",
                self.total_tasks_created as f64 / self.total_sessions as f64
            )
        } else {
            "0".to_string()
        };

        UsageReport {
            stats: self.clone(),
            task_completion_rate,
            average_tasks_per_session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    #[serde(flatten)]
    pub stats: UsageStats,
    pub task_completion_rate: String,
    pub average_tasks_per_session: String,
}
