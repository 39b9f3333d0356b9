//! Changes, tasks and task logs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{StateError, StateResult};

/// Identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a change (a group of tasks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(Uuid);

impl ChangeId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to run.
    #[default]
    Pending,
    /// Handler is executing.
    Running,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Error,
}

impl TaskStatus {
    /// Whether the status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Machine-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

/// Severity of a task log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational message.
    Info,
    /// Error message.
    Error,
}

/// One line of a task log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLogEntry {
    /// When the line was recorded.
    pub at: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

impl fmt::Display for TaskLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        };
        write!(f, "{} {level} {}", self.at.to_rfc3339(), self.message)
    }
}

/// A unit of asynchronous work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    change: ChangeId,
    kind: String,
    summary: String,
    status: TaskStatus,
    log: Vec<TaskLogEntry>,
    data: Map<String, Value>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub(crate) fn new(change: ChangeId, kind: &str, summary: &str) -> Self {
        Self {
            id: TaskId::new(),
            change,
            kind: kind.to_string(),
            summary: summary.to_string(),
            status: TaskStatus::Pending,
            log: Vec::new(),
            data: Map::new(),
            updated_at: Utc::now(),
        }
    }

    /// Task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Change the task belongs to.
    #[must_use]
    pub const fn change(&self) -> ChangeId {
        self.change
    }

    /// Handler kind, e.g. `update-gadget-assets`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Human readable summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Set the status.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Time of the last status change or log line.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Log lines recorded so far.
    #[must_use]
    pub fn log(&self) -> &[TaskLogEntry] {
        &self.log
    }

    /// Append an informational log line.
    pub fn logf(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Info, message.into());
    }

    /// Append an error log line.
    pub fn errorf(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Error, message.into());
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        let at = Utc::now();
        self.log.push(TaskLogEntry { at, level, message });
        self.updated_at = at;
    }

    /// Decode the data stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored value does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StateResult<Option<T>> {
        self.data
            .get(key)
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|source| StateError::TaskData {
                task_id: self.id,
                key: key.to_string(),
                source,
            })
    }

    /// Encode and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` cannot be encoded.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> StateResult<()> {
        let encoded = serde_json::to_value(value).map_err(|source| StateError::TaskData {
            task_id: self.id,
            key: key.to_string(),
            source,
        })?;
        self.data.insert(key.to_string(), encoded);
        Ok(())
    }
}

/// A group of tasks executed together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    id: ChangeId,
    kind: String,
    summary: String,
    tasks: Vec<TaskId>,
}

impl Change {
    pub(crate) fn new(kind: &str, summary: &str) -> Self {
        Self {
            id: ChangeId::new(),
            kind: kind.to_string(),
            summary: summary.to_string(),
            tasks: Vec::new(),
        }
    }

    pub(crate) fn push_task(&mut self, task: TaskId) {
        self.tasks.push(task);
    }

    /// Change identifier.
    #[must_use]
    pub const fn id(&self) -> ChangeId {
        self.id
    }

    /// Change kind, e.g. `refresh-snap` or `remodel`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Tasks in the change, in creation order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }
}
