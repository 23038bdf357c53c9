//! Task and session records.
//!
//! Records are persisted with camelCase keys and ordinal priority/status
//! values (`1..=3`), the same layout the mobile store has always written.
//! Decoding is lenient: a bad field falls back to its default instead of
//! rejecting the whole record (see [`lenient`]).

pub mod lenient;
mod session;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use session::{Session, DEFAULT_SESSION_MINUTES};

/// Task priority. Persisted as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(n: u64) -> Option<Self> {
        match n {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(Priority::Low),
            "medium" | "med" | "2" => Ok(Priority::Medium),
            "high" | "3" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("expected low, medium or high, got '{other}'"),
            }),
        }
    }
}

/// Task status. Persisted as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    ToDo = 1,
    InProgress = 2,
    Completed = 3,
}

impl Status {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(n: u64) -> Option<Self> {
        match n {
            1 => Some(Status::ToDo),
            2 => Some(Status::InProgress),
            3 => Some(Status::Completed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::ToDo
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "todo" | "1" => Ok(Status::ToDo),
            "inprogress" | "doing" | "2" => Ok(Status::InProgress),
            "completed" | "done" | "3" => Ok(Status::Completed),
            other => Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("expected todo, in-progress or completed, got '{other}'"),
            }),
        }
    }
}

/// A user-defined unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default = "lenient::epoch", deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "lenient::serialize_date",
        deserialize_with = "lenient::date"
    )]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Build a task from user input, generating its id and creation time.
    pub fn create(input: NewTask, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let title = validate_title(&input.title)?;
        Ok(Task {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            priority: input.priority,
            status: input.status,
            created_at: now,
            due_date: input.due_date,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Apply a partial edit. `id` and `created_at` are not editable.
    pub fn apply(&mut self, patch: &TaskPatch) -> Result<(), ValidationError> {
        if let Some(title) = &patch.title {
            self.title = validate_title(title)?;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(due) = patch.due_date {
            self.due_date = due;
        }
        Ok(())
    }
}

/// Fields supplied by the user when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: Priority::default(),
            status: Status::default(),
            due_date: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
}

/// Partial update of a task.
///
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}
