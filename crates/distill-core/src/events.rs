use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every timer transition produces one or more events.
///
/// The owner of the timer reacts to them: `Started`/`Restarted` schedule the
/// completion alert, `Paused`/`Reset` cancel it, `FirstStart` records a new
/// session and `Finished` ends the countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    /// First start since the timer was created or last reset.
    FirstStart { at: DateTime<Utc> },
    /// Entered Running with the given deadline.
    Started {
        deadline: DateTime<Utc>,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Paused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Remaining time reached zero.
    Finished { at: DateTime<Utc> },
    Reset { at: DateTime<Utc> },
    /// Fresh full-length run after the user declined to complete the task.
    Restarted {
        deadline: DateTime<Utc>,
        at: DateTime<Utc>,
    },
}

impl TimerEvent {
    /// Deadline to schedule the completion alert for, if this event asks
    /// for one.
    pub fn schedules_alert_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TimerEvent::Started { deadline, .. } | TimerEvent::Restarted { deadline, .. } => {
                Some(*deadline)
            }
            _ => None,
        }
    }

    pub fn cancels_alert(&self) -> bool {
        matches!(self, TimerEvent::Paused { .. } | TimerEvent::Reset { .. })
    }
}
