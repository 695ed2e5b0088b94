//! Due-date relative reminder triggers.
//!
//! Each task carries at most one cursor: the latest stage already fired for
//! it. Stages are ordered (`before` < `on-day` < `after`) and a stage only
//! fires while the cursor is behind it, so nothing fires twice and an earlier
//! stage cannot fire after a later one, even if the clock moves backwards.

use crate::model::{ReminderSettings, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::{OffsetDateTime, UtcOffset};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReminderStage {
    #[serde(rename = "remind-before")]
    Before,
    #[serde(rename = "remind-on-day")]
    OnDay,
    #[serde(rename = "remind-after")]
    After,
}

impl ReminderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderStage::Before => "remind-before",
            ReminderStage::OnDay => "remind-on-day",
            ReminderStage::After => "remind-after",
        }
    }

    fn enabled(self, settings: &ReminderSettings) -> bool {
        match self {
            ReminderStage::Before => settings.remind_before,
            ReminderStage::OnDay => settings.remind_on_day,
            ReminderStage::After => settings.remind_after,
        }
    }

    fn in_window(self, days_until_due: f64) -> bool {
        match self {
            ReminderStage::Before => days_until_due > 0.0 && days_until_due <= 1.5,
            ReminderStage::OnDay => (-0.5..=0.5).contains(&days_until_due),
            ReminderStage::After => days_until_due < -0.5,
        }
    }

    fn message(self, task_name: &str) -> String {
        match self {
            ReminderStage::Before => format!("Your task \"{task_name}\" is due tomorrow!"),
            ReminderStage::OnDay => format!("Your task \"{task_name}\" is due today!"),
            ReminderStage::After => format!(
                "Your task \"{task_name}\" is overdue! Please complete or update it."
            ),
        }
    }
}

impl fmt::Display for ReminderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ReminderCursors = BTreeMap<TaskId, ReminderStage>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderEvent {
    pub task_id: TaskId,
    pub task_name: String,
    pub stage: ReminderStage,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderPlan {
    pub events: Vec<ReminderEvent>,
    pub cursor_updates: ReminderCursors,
}

impl ReminderPlan {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

const STAGES: [ReminderStage; 3] = [
    ReminderStage::Before,
    ReminderStage::OnDay,
    ReminderStage::After,
];

/// Computes which reminders are due at `now`. Pure: the caller applies
/// `cursor_updates` and delivers `events`.
pub fn evaluate(
    now: OffsetDateTime,
    tasks: &[Task],
    settings: &ReminderSettings,
    cursors: &ReminderCursors,
) -> ReminderPlan {
    evaluate_with_offset(now, tasks, settings, cursors, crate::dates::local_offset())
}

pub fn evaluate_with_offset(
    now: OffsetDateTime,
    tasks: &[Task],
    settings: &ReminderSettings,
    cursors: &ReminderCursors,
    offset: UtcOffset,
) -> ReminderPlan {
    let mut plan = ReminderPlan::default();

    for task in tasks {
        if task.completed {
            continue;
        }
        let Some(due) = task
            .due_date
            .as_deref()
            .and_then(|raw| crate::dates::parse_due_date(raw, offset))
        else {
            continue;
        };

        let days_until_due = (due - now).as_seconds_f64() / SECONDS_PER_DAY;
        let cursor = cursors.get(&task.id).copied();

        for stage in STAGES {
            let behind = cursor.is_none_or(|fired| fired < stage);
            if behind && stage.enabled(settings) && stage.in_window(days_until_due) {
                plan.events.push(ReminderEvent {
                    task_id: task.id,
                    task_name: task.name.clone(),
                    stage,
                    message: stage.message(&task.name),
                });
                plan.cursor_updates.insert(task.id, stage);
            }
        }
    }

    plan
}
