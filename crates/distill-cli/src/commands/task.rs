//! Task management commands for CLI.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use distill_core::ranking;
use distill_core::{
    query, Config, NewTask, Priority, SortConfig, SortField, SortOrder, StateStore, Status,
    TaskFilter, TaskPatch,
};
use serde::Serialize;

use super::{open_store, print_json, today, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// todo, in-progress or completed
        #[arg(long, default_value = "todo")]
        status: Status,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// List tasks
    List {
        /// all, overdue, today, upcoming or no-due-date
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// Sort field; remembered for later listings
        #[arg(long)]
        sort: Option<SortField>,
        /// asc or desc; remembered for later listings
        #[arg(long)]
        order: Option<SortOrder>,
        /// Human-readable lines instead of JSON
        #[arg(long)]
        plain: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Edit {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Delete every task and session
    Clear,
    /// Today's top tasks with their scores
    Top {
        /// Defaults to `today.top_count` from the config
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Serialize)]
struct RankedTask<'a> {
    #[serde(flatten)]
    task: &'a distill_core::Task,
    score: u32,
    breakdown: distill_core::ScoreBreakdown,
}

pub fn run(action: TaskAction) -> CmdResult {
    let db = open_store()?;

    match action {
        TaskAction::Add {
            title,
            priority,
            status,
            due,
        } => {
            let mut input = NewTask::new(title).priority(priority).status(status);
            if let Some(due) = due {
                input = input.due(due);
            }
            let task = db.update(|s| s.add_task(input, Utc::now()))??;
            eprintln!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List {
            filter,
            sort,
            order,
            plain,
        } => {
            let mut state = db.load()?;
            if sort.is_some() || order.is_some() {
                let config = SortConfig {
                    field: sort.unwrap_or(state.sort_config.field),
                    order: order.unwrap_or(state.sort_config.order),
                };
                db.update(|s| s.set_sort_config(config))?;
                state.set_sort_config(config);
            }
            let day = today();
            let tasks = query::list(&state.tasks, filter, state.sort_config, day);
            if plain {
                for task in &tasks {
                    println!(
                        "{}  [{}] [{}] {} ({})",
                        task.id,
                        task.priority,
                        task.status,
                        task.title,
                        state.settings.date_format.format_due(task.due_date, day)
                    );
                }
            } else {
                print_json(&tasks)?;
            }
        }
        TaskAction::Get { id } => {
            let state = db.load()?;
            match state.task(&id) {
                Some(task) => print_json(task)?,
                None => return Err(format!("task not found: {id}").into()),
            }
        }
        TaskAction::Edit {
            id,
            title,
            priority,
            status,
            due,
            clear_due,
        } => {
            let patch = TaskPatch {
                title,
                priority,
                status,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
            };
            if patch.is_empty() {
                return Err("nothing to change".into());
            }
            if !db.update(|s| s.edit_task(&id, &patch))?? {
                return Err(format!("task not found: {id}").into());
            }
            let state = db.load()?;
            if let Some(task) = state.task(&id) {
                print_json(task)?;
            }
        }
        TaskAction::Delete { id } => {
            if !db.update(|s| s.delete_task(&id))? {
                return Err(format!("task not found: {id}").into());
            }
            println!("Task deleted: {id}");
        }
        TaskAction::Clear => {
            db.update(|s| s.clear_all())?;
            println!("All tasks and sessions cleared");
        }
        TaskAction::Top { count } => {
            let count = count.unwrap_or_else(|| Config::load_or_default().today.top_count);
            let state = db.load()?;
            let day = today();
            let top = state.today_top_tasks(day, count);
            let ranked: Vec<_> = top
                .iter()
                .map(|task| {
                    let breakdown = ranking::score_breakdown(task, day);
                    RankedTask {
                        task,
                        score: breakdown.total(),
                        breakdown,
                    }
                })
                .collect();
            print_json(&ranked)?;
        }
    }
    Ok(())
}
