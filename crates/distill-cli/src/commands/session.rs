//! Focus session records.

use chrono::Utc;
use clap::Subcommand;
use distill_core::StateStore;

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List recorded sessions
    List {
        /// Only sessions of this task
        #[arg(long)]
        task: Option<String>,
    },
    /// Mark a session complete
    Complete {
        /// Session ID
        id: String,
    },
    /// Delete a session
    Delete {
        /// Session ID
        id: String,
    },
}

pub fn run(action: SessionAction) -> CmdResult {
    let db = open_store()?;

    match action {
        SessionAction::List { task } => {
            let state = db.load()?;
            let sessions: Vec<_> = state
                .sessions
                .iter()
                .filter(|s| task.as_deref().map_or(true, |id| s.task_id == id))
                .collect();
            print_json(&sessions)?;
        }
        SessionAction::Complete { id } => {
            let now = Utc::now();
            let (exists, completed) = db.update(|s| {
                let exists = s.sessions.iter().any(|session| session.id == id);
                (exists, s.complete_session(&id, now))
            })?;
            if !exists {
                return Err(format!("session not found: {id}").into());
            }
            if completed {
                println!("Session completed: {id}");
            } else {
                println!("Session already completed: {id}");
            }
        }
        SessionAction::Delete { id } => {
            if !db.update(|s| s.delete_session(&id))? {
                return Err(format!("session not found: {id}").into());
            }
            println!("Session deleted: {id}");
        }
    }
    Ok(())
}
