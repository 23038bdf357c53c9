//! Task ranking engine.
//!
//! Produces the "top tasks for today" ordering. Ranking is a pure function
//! of the task collection and the calendar day it is evaluated on.
//!
//! ## Score
//!
//! ```text
//! score = priority + status + due date
//! ```
//!
//! | Component | Value | Points |
//! |-----------|-------|--------|
//! | Priority  | High / Medium / Low | 300 / 200 / 100 |
//! | Status    | In progress / To do | 150 / 50 |
//! | Due date  | overdue | 500 |
//! |           | today | 400 |
//! |           | tomorrow | 300 |
//! |           | in 2..=3 days | 200 |
//! |           | in 4..=7 days | 100 |
//! |           | later or none | 0 |
//!
//! Completed tasks are never ranked. Equal scores keep the older task first.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Status, Task};

/// How close a due date is, in whole days from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueBucket {
    Overdue,
    Today,
    Tomorrow,
    WithinThreeDays,
    WithinWeek,
    Later,
    NoDueDate,
}

impl DueBucket {
    pub fn classify(due: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(due) = due else {
            return DueBucket::NoDueDate;
        };
        match (due - today).num_days() {
            d if d < 0 => DueBucket::Overdue,
            0 => DueBucket::Today,
            1 => DueBucket::Tomorrow,
            2..=3 => DueBucket::WithinThreeDays,
            4..=7 => DueBucket::WithinWeek,
            _ => DueBucket::Later,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            DueBucket::Overdue => 500,
            DueBucket::Today => 400,
            DueBucket::Tomorrow => 300,
            DueBucket::WithinThreeDays => 200,
            DueBucket::WithinWeek => 100,
            DueBucket::Later | DueBucket::NoDueDate => 0,
        }
    }
}

pub fn priority_points(priority: Priority) -> u32 {
    match priority {
        Priority::High => 300,
        Priority::Medium => 200,
        Priority::Low => 100,
    }
}

pub fn status_points(status: Status) -> u32 {
    match status {
        Status::InProgress => 150,
        Status::ToDo => 50,
        Status::Completed => 0,
    }
}

/// Per-component contributions of a task's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub priority: u32,
    pub status: u32,
    pub due: u32,
    pub bucket: DueBucket,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.priority + self.status + self.due
    }
}

pub fn score_breakdown(task: &Task, today: NaiveDate) -> ScoreBreakdown {
    let bucket = DueBucket::classify(task.due_date, today);
    ScoreBreakdown {
        priority: priority_points(task.priority),
        status: status_points(task.status),
        due: bucket.points(),
        bucket,
    }
}

pub fn score(task: &Task, today: NaiveDate) -> u32 {
    score_breakdown(task, today).total()
}

/// Rank every actionable task, highest score first.
///
/// Truncation is left to the caller; see [`top_tasks`].
pub fn rank(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    let mut scored: Vec<(u32, &Task)> = tasks
        .iter()
        .filter(|t| t.status != Status::Completed)
        .map(|t| (score(t, today), t))
        .collect();

    // Stable sort, so identical (score, created_at) pairs keep input order.
    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.created_at.cmp(&b.created_at)));

    scored.into_iter().map(|(_, t)| t.clone()).collect()
}

/// Rank against the local calendar day.
pub fn rank_today(tasks: &[Task]) -> Vec<Task> {
    rank(tasks, Local::now().date_naive())
}

pub fn top_tasks(tasks: &[Task], today: NaiveDate, count: usize) -> Vec<Task> {
    let mut ranked = rank(tasks, today);
    ranked.truncate(count);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 11).unwrap()
    }

    fn created(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, minute, 0).unwrap()
    }

    fn task(id: &str, priority: Priority, status: Status, due_in: Option<i64>, minute: u32) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            priority,
            status,
            created_at: created(minute),
            due_date: due_in.map(|d| today() + Duration::days(d)),
        }
    }

    #[test]
    fn empty_input_ranks_to_empty() {
        assert!(rank(&[], today()).is_empty());
    }

    #[test]
    fn completed_tasks_are_excluded() {
        let tasks = vec![
            task("done", Priority::High, Status::Completed, Some(-3), 0),
            task("open", Priority::Low, Status::ToDo, None, 1),
        ];
        let ranked = rank(&tasks, today());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "open");
    }

    #[test]
    fn due_bucket_boundaries() {
        let base = priority_points(Priority::Medium) + status_points(Status::ToDo);
        let cases = [
            (-1, 500),
            (0, 400),
            (1, 300),
            (2, 200),
            (3, 200),
            (4, 100),
            (7, 100),
            (8, 0),
        ];
        for (days, extra) in cases {
            let t = task("t", Priority::Medium, Status::ToDo, Some(days), 0);
            assert_eq!(score(&t, today()), base + extra, "due in {days} days");
        }
        let none = task("t", Priority::Medium, Status::ToDo, None, 0);
        assert_eq!(score(&none, today()), base);
    }

    #[test]
    fn ties_order_by_creation_time() {
        let tasks = vec![
            task("newer", Priority::Medium, Status::ToDo, None, 30),
            task("older", Priority::Medium, Status::ToDo, None, 5),
        ];
        let ids: Vec<_> = rank(&tasks, today()).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["older", "newer"]);
    }

    #[test]
    fn high_due_today_beats_low_in_progress() {
        let a = task("a", Priority::High, Status::ToDo, Some(0), 10);
        let b = task("b", Priority::Low, Status::InProgress, None, 1);
        assert_eq!(score(&a, today()), 750);
        assert_eq!(score(&b, today()), 250);
        let ids: Vec<_> = rank(&[b, a], today()).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn top_tasks_truncates_after_ranking() {
        let tasks: Vec<_> = (0..5)
            .map(|i| task(&format!("t{i}"), Priority::Low, Status::ToDo, Some(i), i as u32))
            .collect();
        let top = top_tasks(&tasks, today(), 3);
        let ids: Vec<_> = top.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["t0", "t1", "t2"]);
    }

    #[test]
    fn breakdown_reports_bucket() {
        let t = task("t", Priority::High, Status::InProgress, Some(-10), 0);
        let b = score_breakdown(&t, today());
        assert_eq!(b.bucket, DueBucket::Overdue);
        assert_eq!(b.total(), 300 + 150 + 500);
    }
}
