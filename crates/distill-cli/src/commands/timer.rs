//! Foreground focus timer.

use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use distill_core::state::validate_duration;
use distill_core::timer::{self, SessionCommand};
use distill_core::{
    Config, Database, FocusSession, LogNotifier, Notifier, SessionEvent, SessionTask, StateStore,
    SystemClock,
};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a focus session for a task until the countdown ends or Ctrl-C
    Run {
        /// Task ID
        #[arg(long)]
        task: String,
        /// Session length; defaults to the `timeDuration` setting
        #[arg(long)]
        minutes: Option<u32>,
        /// Start immediately; also enabled by the `autoStartTimer` setting
        #[arg(long)]
        auto_start: bool,
    },
}

pub fn run(action: TimerAction) -> CmdResult {
    match action {
        TimerAction::Run {
            task,
            minutes,
            auto_start,
        } => {
            let db = open_store()?;
            let state = db.load()?;
            let Some(found) = state.task(&task) else {
                return Err(format!("task not found: {task}").into());
            };
            let minutes = validate_duration(minutes.unwrap_or(state.settings.time_duration))?;
            let auto_start = auto_start || state.settings.auto_start_timer;
            let config = Config::load_or_default();

            let session_task = SessionTask::new(Some(found.id.clone()), found.title.clone(), minutes);
            let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
            let session = FocusSession::new(
                session_task.clone(),
                auto_start,
                notifier,
                Arc::new(SystemClock),
            )
            .notifications(config.notifications.enabled);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(drive(
                &db,
                session,
                &session_task,
                auto_start,
                config.timer.tick_interval(),
            ))
        }
    }
}

async fn drive(
    db: &Database,
    session: FocusSession,
    task: &SessionTask,
    auto_start: bool,
    period: Duration,
) -> CmdResult {
    let (handle, mut updates) = timer::spawn(session, period);
    if !auto_start {
        handle.send(SessionCommand::Start).await;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                match update {
                    SessionEvent::SessionStarted { task_id: Some(task_id), duration_min, at } => {
                        let recorded =
                            db.update(|s| s.start_session(&task_id, Some(duration_min), at))?;
                        eprintln!("Session started: {}", recorded.id);
                    }
                    SessionEvent::Timer(event) => print_json(&event)?,
                    SessionEvent::Tick(snapshot) => eprint!("\r{} ", snapshot.display),
                    SessionEvent::Finished { at } => {
                        eprintln!("\r00:00");
                        print_json(&serde_json::json!({ "type": "Finished", "at": at }))?;
                        eprintln!(
                            "Did you complete '{}'? Answer with: distill notify action complete --task-id {} --duration {}",
                            task.title,
                            task.task_id.as_deref().unwrap_or_default(),
                            task.duration_min
                        );
                        break;
                    }
                    SessionEvent::Closed => break,
                    SessionEvent::SessionStarted { task_id: None, .. }
                    | SessionEvent::TaskCompleted(_) => {}
                }
            }
            _ = &mut ctrl_c => {
                eprintln!();
                handle.send(SessionCommand::Pause).await;
                break;
            }
        }
    }

    handle.close().await;
    while let Some(update) = updates.recv().await {
        if let SessionEvent::Timer(event) = update {
            print_json(&event)?;
        }
    }
    Ok(())
}
