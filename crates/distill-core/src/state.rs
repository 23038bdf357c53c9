//! Application state held by the persisted store.
//!
//! `AppState` is the whole durable document: tasks, sessions, the list of
//! tasks focused on today, the task list ordering and user settings. All
//! mutations go through the methods below; every method that takes an id is
//! a no-op when the id is unknown.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::query::SortConfig;
use crate::ranking;
use crate::stats;
use crate::task::{lenient, NewTask, Session, Status, Task, TaskPatch};

/// Accepted range for the session length setting, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 1;
pub const MAX_DURATION_MINUTES: u32 = 120;

fn default_time_duration() -> u32 {
    25
}

/// How due dates are shown in task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `07 Mar, 2026`
    #[default]
    Normal,
    /// `in 3 days`, `yesterday`
    Relative,
}

impl DateFormat {
    pub fn format_due(self, due: Option<NaiveDate>, today: NaiveDate) -> String {
        let Some(due) = due else {
            return "No Due Date".to_string();
        };
        match self {
            DateFormat::Normal => due.format("%d %b, %Y").to_string(),
            DateFormat::Relative => match (due - today).num_days() {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                -1 => "yesterday".to_string(),
                d if d > 1 => format!("in {d} days"),
                d => format!("{} days ago", -d),
            },
        }
    }
}

impl std::str::FromStr for DateFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(DateFormat::Normal),
            "relative" => Ok(DateFormat::Relative),
            other => Err(ValidationError::InvalidValue {
                field: "dateFormat".into(),
                message: format!("expected normal or relative, got '{other}'"),
            }),
        }
    }
}

/// User settings, stored at the top level of the state document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Session length in minutes.
    #[serde(default = "default_time_duration", deserialize_with = "lenient_duration")]
    pub time_duration: u32,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub auto_start_timer: bool,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub date_format: DateFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_duration: default_time_duration(),
            auto_start_timer: false,
            date_format: DateFormat::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub time_duration: Option<u32>,
    pub auto_start_timer: Option<bool>,
    pub date_format: Option<DateFormat>,
}

/// Decode the stored session length, falling back to the default when it is
/// not a whole number of minutes in range.
fn lenient_duration<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let minutes = value
        .as_u64()
        .and_then(|m| u32::try_from(m).ok())
        .and_then(|m| validate_duration(m).ok());
    Ok(minutes.unwrap_or_else(|| {
        tracing::warn!(raw = %value, "ignoring invalid session length");
        default_time_duration()
    }))
}

pub fn validate_duration(minutes: u32) -> Result<u32, ValidationError> {
    if (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::DurationOutOfRange {
            min: MIN_DURATION_MINUTES,
            max: MAX_DURATION_MINUTES,
            got: minutes,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default, deserialize_with = "lenient::records")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "lenient::records")]
    pub sessions: Vec<Session>,
    /// Task ids whose focus session was completed today.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub today_focus_tasks: Vec<String>,
    /// Calendar day the state was last rolled to.
    #[serde(
        default,
        serialize_with = "lenient::serialize_date",
        deserialize_with = "lenient::date"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub sort_config: SortConfig,
    #[serde(flatten)]
    pub settings: Settings,
}

impl AppState {
    // ── Tasks ────────────────────────────────────────────────────────

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn add_task(&mut self, input: NewTask, now: DateTime<Utc>) -> Result<Task, ValidationError> {
        let task = Task::create(input, now)?;
        tracing::debug!(id = %task.id, "task added");
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Returns `Ok(false)` when no task has this id.
    pub fn edit_task(&mut self, id: &str, patch: &TaskPatch) -> Result<bool, ValidationError> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            tracing::debug!(id, "edit ignored, unknown task");
            return Ok(false);
        };
        task.apply(patch)?;
        Ok(true)
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        before != self.tasks.len()
    }

    /// Drop every task, session and today's focus list. Settings stay.
    pub fn clear_all(&mut self) {
        self.tasks.clear();
        self.sessions.clear();
        self.today_focus_tasks.clear();
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn start_session(
        &mut self,
        task_id: &str,
        duration: Option<u32>,
        now: DateTime<Utc>,
    ) -> Session {
        let session = Session::start(task_id, duration, now);
        tracing::debug!(id = %session.id, task_id, "session started");
        self.sessions.push(session.clone());
        session
    }

    /// Mark a session complete and add its task to today's focus list.
    /// Completing an already completed session changes nothing.
    pub fn complete_session(&mut self, session_id: &str, now: DateTime<Utc>) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return false;
        };
        if session.completed_at.is_some() {
            return false;
        }
        session.completed_at = Some(now);
        let task_id = session.task_id.clone();
        if !self.today_focus_tasks.contains(&task_id) {
            self.today_focus_tasks.push(task_id);
        }
        true
    }

    /// Complete the most recent open session of a task, if there is one.
    pub fn finish_task_session(&mut self, task_id: &str, now: DateTime<Utc>) -> Option<String> {
        let session_id = self
            .sessions
            .iter()
            .filter(|s| s.task_id == task_id && s.is_open())
            .max_by_key(|s| s.started_at)
            .map(|s| s.id.clone())?;
        self.complete_session(&session_id, now).then_some(session_id)
    }

    pub fn delete_session(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        before != self.sessions.len()
    }

    // ── Day, ordering, settings ──────────────────────────────────────

    /// Roll the state to `date`. A new day empties today's focus list.
    pub fn set_date(&mut self, date: NaiveDate) -> bool {
        if self.date == Some(date) {
            return false;
        }
        self.date = Some(date);
        self.today_focus_tasks.clear();
        true
    }

    pub fn set_sort_config(&mut self, config: SortConfig) {
        self.sort_config = config;
    }

    /// Apply a partial settings update. Nothing changes if any field is
    /// invalid.
    pub fn change_settings(&mut self, patch: SettingsPatch) -> Result<(), ValidationError> {
        if let Some(minutes) = patch.time_duration {
            validate_duration(minutes)?;
        }
        self.settings.time_duration = patch.time_duration.unwrap_or(self.settings.time_duration);
        self.settings.auto_start_timer =
            patch.auto_start_timer.unwrap_or(self.settings.auto_start_timer);
        self.settings.date_format = patch.date_format.unwrap_or(self.settings.date_format);
        Ok(())
    }

    // ── Selectors ────────────────────────────────────────────────────

    pub fn today_top_tasks(&self, today: NaiveDate, count: usize) -> Vec<Task> {
        ranking::top_tasks(&self.tasks, today, count)
    }

    pub fn today_completed_tasks(&self, today: NaiveDate) -> Vec<Task> {
        stats::completed_today(&self.tasks, today)
    }

    pub fn mark_completed(&mut self, task_id: &str) -> bool {
        matches!(self.edit_task(task_id, &TaskPatch::status(Status::Completed)), Ok(true))
    }
}
