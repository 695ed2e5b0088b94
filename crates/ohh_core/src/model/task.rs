use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary key of a task. Shaped like a millisecond timestamp but allocated
/// monotonically by the store, so two tasks never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Reminder,
    Claiming,
    Staking,
    Other,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Reminder,
        TaskType::Claiming,
        TaskType::Staking,
        TaskType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Reminder => "reminder",
            TaskType::Claiming => "claiming",
            TaskType::Staking => "staking",
            TaskType::Other => "other",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            TaskType::Reminder => "📌",
            TaskType::Claiming => "🎁",
            TaskType::Staking => "💰",
            TaskType::Other => "📝",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        TaskType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| format!("unknown task type '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: String,
}

/// The caller-editable part of a task, used for both creation and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub chain: String,
    pub protocol: String,
    pub due_date: Option<String>,
}

impl TaskDraft {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn chain<C: Into<String>>(mut self, chain: C) -> Self {
        self.chain = chain.into();
        self
    }

    pub fn protocol<P: Into<String>>(mut self, protocol: P) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn due_date<D: Into<String>>(mut self, due_date: D) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            task_type: task.task_type,
            chain: task.chain.clone(),
            protocol: task.protocol.clone(),
            due_date: task.due_date.clone(),
        }
    }
}
