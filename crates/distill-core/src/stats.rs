//! Overview statistics over tasks and focus sessions.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Session, Status, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub to_do: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Completed-task count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    /// Short weekday name, e.g. "Mon".
    pub label: String,
    pub completed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTotals {
    pub sessions_today: usize,
    pub completed_sessions: usize,
    pub planned_minutes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub total_tasks: usize,
    pub status: StatusBreakdown,
    pub priority: PriorityBreakdown,
    pub last_7_days: Vec<DayCount>,
    pub focus: FocusTotals,
}

fn local_day(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

pub fn status_breakdown(tasks: &[Task]) -> StatusBreakdown {
    tasks.iter().fold(StatusBreakdown::default(), |mut acc, t| {
        match t.status {
            Status::ToDo => acc.to_do += 1,
            Status::InProgress => acc.in_progress += 1,
            Status::Completed => acc.completed += 1,
        }
        acc
    })
}

pub fn priority_breakdown(tasks: &[Task]) -> PriorityBreakdown {
    tasks.iter().fold(PriorityBreakdown::default(), |mut acc, t| {
        match t.priority {
            Priority::High => acc.high += 1,
            Priority::Medium => acc.medium += 1,
            Priority::Low => acc.low += 1,
        }
        acc
    })
}

/// Completed tasks per day over the week ending `today`, oldest first.
///
/// Tasks carry no completion timestamp, so a completed task is counted on
/// the day it was created.
pub fn completed_last_7_days(tasks: &[Task], today: NaiveDate) -> Vec<DayCount> {
    (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let completed = tasks
                .iter()
                .filter(|t| t.is_completed() && local_day(t.created_at) == date)
                .count();
            DayCount {
                date,
                label: date.format("%a").to_string(),
                completed,
            }
        })
        .collect()
}

/// Completed tasks created on `today`.
pub fn completed_today(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.is_completed() && local_day(t.created_at) == today)
        .cloned()
        .collect()
}

pub fn focus_totals(sessions: &[Session], today: NaiveDate) -> FocusTotals {
    FocusTotals {
        sessions_today: sessions
            .iter()
            .filter(|s| local_day(s.started_at) == today)
            .count(),
        completed_sessions: sessions.iter().filter(|s| !s.is_open()).count(),
        planned_minutes: sessions.iter().map(|s| u64::from(s.duration)).sum(),
    }
}

pub fn overview(tasks: &[Task], sessions: &[Session], today: NaiveDate) -> Overview {
    Overview {
        total_tasks: tasks.len(),
        status: status_breakdown(tasks),
        priority: priority_breakdown(tasks),
        last_7_days: completed_last_7_days(tasks, today),
        focus: focus_totals(sessions, today),
    }
}
