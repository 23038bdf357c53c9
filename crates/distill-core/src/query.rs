//! Task list filtering and sorting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::task::Task;

/// Due-date filter for the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Overdue,
    Today,
    Upcoming,
    NoDueDate,
}

impl TaskFilter {
    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match (self, task.due_date) {
            (TaskFilter::All, _) => true,
            (TaskFilter::Overdue, Some(due)) => due < today,
            (TaskFilter::Today, Some(due)) => due == today,
            (TaskFilter::Upcoming, Some(due)) => due > today,
            (TaskFilter::NoDueDate, due) => due.is_none(),
            (_, None) => false,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "all" => Ok(TaskFilter::All),
            "overdue" => Ok(TaskFilter::Overdue),
            "today" => Ok(TaskFilter::Today),
            "upcoming" => Ok(TaskFilter::Upcoming),
            "noduedate" | "none" => Ok(TaskFilter::NoDueDate),
            other => Err(ValidationError::InvalidValue {
                field: "filter".into(),
                message: format!("unknown filter '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Priority,
    Status,
    DueDate,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Task list ordering, persisted with the rest of the application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            field: SortField::Priority,
            order: SortOrder::Desc,
        }
    }
}

impl fmt::Display for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Priority => "priority",
            SortField::Status => "status",
            SortField::DueDate => "dueDate",
            SortField::CreatedAt => "createdAt",
        };
        let order = match self.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        write!(f, "{field} {order}")
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "priority" => Ok(SortField::Priority),
            "status" => Ok(SortField::Status),
            "duedate" | "due" => Ok(SortField::DueDate),
            "createdat" | "created" => Ok(SortField::CreatedAt),
            other => Err(ValidationError::InvalidValue {
                field: "sort field".into(),
                message: format!("unknown sort field '{other}'"),
            }),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ValidationError::InvalidValue {
                field: "sort order".into(),
                message: format!("expected asc or desc, got '{other}'"),
            }),
        }
    }
}

/// Compare two tasks by a field, ignoring order except for missing due
/// dates, which always sort last.
fn compare(a: &Task, b: &Task, config: SortConfig) -> Ordering {
    let ordered = |o: Ordering| match config.order {
        SortOrder::Asc => o,
        SortOrder::Desc => o.reverse(),
    };
    match config.field {
        SortField::Priority => ordered(a.priority.cmp(&b.priority)),
        SortField::Status => ordered(a.status.cmp(&b.status)),
        SortField::CreatedAt => ordered(a.created_at.cmp(&b.created_at)),
        SortField::DueDate => match (a.due_date, b.due_date) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => ordered(x.cmp(&y)),
        },
    }
}

/// Filter then stable-sort the task list.
pub fn list(tasks: &[Task], filter: TaskFilter, sort: SortConfig, today: NaiveDate) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|t| filter.matches(t, today))
        .cloned()
        .collect();
    out.sort_by(|a, b| compare(a, b, sort));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, Status};
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 20).unwrap()
    }

    fn task(id: &str, priority: Priority, due_in: Option<i64>) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            priority,
            status: Status::ToDo,
            created_at: Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
            due_date: due_in.map(|d| today() + Duration::days(d)),
        }
    }

    fn ids(tasks: Vec<Task>) -> Vec<String> {
        tasks.into_iter().map(|t| t.id).collect()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("late", Priority::Low, Some(-2)),
            task("now", Priority::High, Some(0)),
            task("soon", Priority::Medium, Some(3)),
            task("whenever", Priority::Medium, None),
        ]
    }

    #[test]
    fn filters_by_due_date() {
        let all = sample();
        let sort = SortConfig {
            field: SortField::CreatedAt,
            order: SortOrder::Asc,
        };
        assert_eq!(ids(list(&all, TaskFilter::Overdue, sort, today())), ["late"]);
        assert_eq!(ids(list(&all, TaskFilter::Today, sort, today())), ["now"]);
        assert_eq!(ids(list(&all, TaskFilter::Upcoming, sort, today())), ["soon"]);
        assert_eq!(ids(list(&all, TaskFilter::NoDueDate, sort, today())), ["whenever"]);
        assert_eq!(list(&all, TaskFilter::All, sort, today()).len(), 4);
    }

    #[test]
    fn default_sort_is_priority_descending() {
        let sorted = ids(list(&sample(), TaskFilter::All, SortConfig::default(), today()));
        assert_eq!(sorted, ["now", "soon", "whenever", "late"]);
    }

    #[test]
    fn missing_due_dates_sort_last_in_both_orders() {
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let sort = SortConfig {
                field: SortField::DueDate,
                order,
            };
            let sorted = ids(list(&sample(), TaskFilter::All, sort, today()));
            assert_eq!(sorted.last().map(String::as_str), Some("whenever"), "{order:?}");
        }
        let asc = SortConfig {
            field: SortField::DueDate,
            order: SortOrder::Asc,
        };
        assert_eq!(
            ids(list(&sample(), TaskFilter::All, asc, today())),
            ["late", "now", "soon", "whenever"]
        );
    }

    #[test]
    fn sort_config_uses_mobile_field_names() {
        let json = serde_json::to_string(&SortConfig {
            field: SortField::DueDate,
            order: SortOrder::Asc,
        })
        .unwrap();
        assert_eq!(json, r#"{"field":"dueDate","order":"asc"}"#);
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("no-due-date".parse::<TaskFilter>().unwrap(), TaskFilter::NoDueDate);
        assert_eq!("due_date".parse::<SortField>().unwrap(), SortField::DueDate);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
