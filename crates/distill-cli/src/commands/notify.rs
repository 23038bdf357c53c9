//! Relay an answer from the completion alert.
//!
//! Stands in for the platform handing over an action while no timer is
//! running in this process.

use chrono::Utc;
use clap::Subcommand;
use distill_core::{
    ActionInbox, AlertPayload, Config, LogNotifier, NoopNotifier, NotificationAction, Notifier,
};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Apply an alert action ("complete" or "restart")
    Action {
        /// Action identifier
        action_id: String,
        /// Task the alert was about
        #[arg(long, default_value = "")]
        task_id: String,
        /// Planned session length in minutes
        #[arg(long, default_value = "25")]
        duration: u32,
        /// Task title shown in the alert
        #[arg(long, default_value = "")]
        title: String,
    },
}

pub fn run(action: NotifyAction) -> CmdResult {
    match action {
        NotifyAction::Action {
            action_id,
            task_id,
            duration,
            title,
        } => {
            let payload = AlertPayload {
                task_id,
                duration,
                title,
            };
            let action = NotificationAction::parse(&action_id, payload)?;

            let notifier: Box<dyn Notifier> = if Config::load_or_default().notifications.enabled {
                Box::new(LogNotifier)
            } else {
                Box::new(NoopNotifier)
            };

            let mut inbox = ActionInbox::new();
            inbox.deliver(action);
            let db = open_store()?;
            let outcomes = inbox.drain(&db, notifier.as_ref(), Utc::now())?;
            print_json(&outcomes)?;
        }
    }
    Ok(())
}
