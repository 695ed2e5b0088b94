use crate::catalog;
use crate::dates;
use crate::model::Task;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "📋 All",
            StatusFilter::Pending => "⏳ Pending",
            StatusFilter::Completed => "✅ Done",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "completed" | "done" => Ok(StatusFilter::Completed),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    DateCreated,
    DueDate,
    Status,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::DateCreated => SortKey::DueDate,
            SortKey::DueDate => SortKey::Status,
            SortKey::Status => SortKey::DateCreated,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::DateCreated => "📅 Created",
            SortKey::DueDate => "🏁 Due",
            SortKey::Status => "✓ Status",
        }
    }

    /// Parses a sort name; anything unrecognised sorts by creation date.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "due-date" | "duedate" | "due" => SortKey::DueDate,
            "status" => SortKey::Status,
            _ => SortKey::DateCreated,
        }
    }

    fn compare(self, a: &SortFields, b: &SortFields) -> Ordering {
        match self {
            // Newest first.
            SortKey::DateCreated => b.created.cmp(&a.created),
            SortKey::DueDate => match (a.due, b.due) {
                (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Status => a.completed.cmp(&b.completed),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::DateCreated => "date-created",
            SortKey::DueDate => "due-date",
            SortKey::Status => "status",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl ListQuery {
    fn matches_search(&self, task: &Task, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        task.name.to_lowercase().contains(needle)
            || task
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(needle))
            || catalog::chain_name(&task.chain)
                .to_lowercase()
                .contains(needle)
    }
}

struct SortFields {
    created: Option<OffsetDateTime>,
    due: Option<OffsetDateTime>,
    completed: bool,
}

impl SortFields {
    fn of(task: &Task, offset: UtcOffset) -> Self {
        Self {
            created: dates::parse_rfc3339(&task.created_at),
            due: task
                .due_date
                .as_deref()
                .and_then(|raw| dates::parse_due_date(raw, offset)),
            completed: task.completed,
        }
    }
}

/// Filters and orders `tasks` without copying them. Sorting is stable, so
/// ties keep collection order.
pub fn project<'a>(tasks: &'a [Task], query: &ListQuery) -> Vec<&'a Task> {
    project_with_offset(tasks, query, dates::local_offset())
}

pub fn project_with_offset<'a>(
    tasks: &'a [Task],
    query: &ListQuery,
    offset: UtcOffset,
) -> Vec<&'a Task> {
    let needle = query.search.trim().to_lowercase();
    let mut rows: Vec<(SortFields, &Task)> = tasks
        .iter()
        .filter(|task| query.status.matches(task) && query.matches_search(task, &needle))
        .map(|task| (SortFields::of(task, offset), task))
        .collect();

    rows.sort_by(|(a, _), (b, _)| query.sort.compare(a, b));
    rows.into_iter().map(|(_, task)| task).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: u32,
}

pub fn summarize(tasks: &[Task]) -> TaskSummary {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();
    let completion_rate = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };

    TaskSummary {
        total,
        completed,
        pending: total - completed,
        completion_rate,
    }
}
