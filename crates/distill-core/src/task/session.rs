use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;

/// Planned length used when a session is recorded without one.
pub const DEFAULT_SESSION_MINUTES: u32 = 25;

fn default_duration() -> u32 {
    DEFAULT_SESSION_MINUTES
}

/// One focus-timer run for a task.
///
/// `task_id` is a weak reference: deleting the task leaves its sessions
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub task_id: String,
    #[serde(default = "lenient::epoch", deserialize_with = "lenient::timestamp")]
    pub started_at: DateTime<Utc>,
    /// Planned length in minutes.
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_timestamp"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn start(task_id: impl Into<String>, duration: Option<u32>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            started_at: now,
            duration: duration.unwrap_or(DEFAULT_SESSION_MINUTES),
            completed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_defaults_duration() {
        let now = Utc::now();
        let session = Session::start("task-1", None, now);
        assert_eq!(session.duration, DEFAULT_SESSION_MINUTES);
        assert_eq!(session.started_at, now);
        assert!(session.is_open());
    }

    #[test]
    fn missing_duration_decodes_to_default() {
        let json = r#"{"id":"s","taskId":"t","startedAt":"2026-03-01T08:00:00Z"}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.duration, 25);
        assert_eq!(session.completed_at, None);
    }
}
