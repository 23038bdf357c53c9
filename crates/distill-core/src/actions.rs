//! Responses relayed back from a delivered completion alert.
//!
//! The platform may hand an action over before the persisted state has
//! finished loading (cold start from the alert). [`ActionInbox`] holds such
//! actions and applies them in arrival order once the store is ready.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, ValidationError};
use crate::notify::{ActionId, AlertPayload, AlertRequest, Notifier};
use crate::state::AppState;
use crate::storage::StateStore;
use crate::task::DEFAULT_SESSION_MINUTES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub action_id: ActionId,
    pub payload: AlertPayload,
}

impl NotificationAction {
    pub fn new(action_id: ActionId, payload: AlertPayload) -> Self {
        Self { action_id, payload }
    }

    /// Build from the raw action identifier handed over by the platform.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnknownAction`] for anything other than
    /// `complete` or `restart`, including the platform's default tap.
    pub fn parse(action_id: &str, payload: AlertPayload) -> Result<Self, ValidationError> {
        Ok(Self::new(action_id.parse()?, payload))
    }
}

/// What applying an action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    TaskCompleted {
        task_id: String,
        /// The open session that was finished, if the task had one.
        session_id: Option<String>,
    },
    /// No timer was live; the alert was moved to `fire_at`.
    Rescheduled { fire_at: DateTime<Utc> },
    Ignored { reason: String },
}

impl ActionOutcome {
    fn ignored(reason: impl Into<String>) -> Self {
        ActionOutcome::Ignored {
            reason: reason.into(),
        }
    }
}

/// Mark the payload's task Completed and finish its open session.
///
/// Unknown tasks are a no-op. Completing twice finishes the session once.
pub fn complete_task(state: &mut AppState, payload: &AlertPayload, now: DateTime<Utc>) -> ActionOutcome {
    let Some(task_id) = payload.task_id() else {
        return ActionOutcome::ignored("alert carries no task");
    };
    if !state.mark_completed(task_id) {
        tracing::warn!(task_id, "complete action for unknown task");
        return ActionOutcome::ignored(format!("unknown task {task_id}"));
    }
    let session_id = state.finish_task_session(task_id, now);
    if session_id.is_none() {
        tracing::debug!(task_id, "no open session to finish");
    }
    ActionOutcome::TaskCompleted {
        task_id: task_id.to_string(),
        session_id,
    }
}

/// Replace the pending alert with a fresh one `duration` minutes from `now`.
///
/// Used when no timer is live to restart, e.g. the process was not in the
/// foreground when the user answered.
pub fn reschedule(notifier: &dyn Notifier, payload: &AlertPayload, now: DateTime<Utc>) -> ActionOutcome {
    let minutes = if payload.duration == 0 {
        DEFAULT_SESSION_MINUTES
    } else {
        payload.duration
    };
    let fire_at = now + Duration::minutes(i64::from(minutes));
    if let Err(e) = notifier.cancel() {
        tracing::warn!(error = %e, "failed to cancel alert before rescheduling");
    }
    let request = AlertRequest::timer_completion(fire_at, &payload.title, minutes, payload.task_id());
    if let Err(e) = notifier.schedule(&request) {
        tracing::warn!(error = %e, "failed to reschedule alert");
    }
    ActionOutcome::Rescheduled { fire_at }
}

/// Apply one action with no live timer.
pub fn apply(
    action: &NotificationAction,
    state: &mut AppState,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> ActionOutcome {
    tracing::debug!(action = %action.action_id, task_id = %action.payload.task_id, "applying action");
    match action.action_id {
        ActionId::Complete => {
            if let Err(e) = notifier.cancel() {
                tracing::warn!(error = %e, "failed to clear delivered alert");
            }
            complete_task(state, &action.payload, now)
        }
        ActionId::Restart => reschedule(notifier, &action.payload, now),
    }
}

/// Queue for actions that arrive before the store can take writes.
#[derive(Debug, Default)]
pub struct ActionInbox {
    queue: VecDeque<NotificationAction>,
}

impl ActionInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliver(&mut self, action: NotificationAction) {
        self.queue.push_back(action);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply every queued action in arrival order and persist the result.
    ///
    /// Does nothing while the store is not ready; the queue is kept for the
    /// next call.
    ///
    /// # Errors
    /// Returns an error if the state cannot be loaded or saved. The queue is
    /// left untouched in that case.
    pub fn drain<S>(
        &mut self,
        store: &S,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionOutcome>, StoreError>
    where
        S: StateStore + ?Sized,
    {
        if self.queue.is_empty() || !store.is_ready() {
            return Ok(Vec::new());
        }
        let mut state = store.load()?;
        let outcomes: Vec<_> = self
            .queue
            .iter()
            .map(|action| apply(action, &mut state, notifier, now))
            .collect();
        store.save(&state)?;
        self.queue.clear();
        Ok(outcomes)
    }
}

/// Poll until the store reports ready.
pub async fn wait_until_ready<S>(store: &S, poll: std::time::Duration)
where
    S: StateStore + ?Sized,
{
    while !store.is_ready() {
        tokio::time::sleep(poll).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotifierCall, RecordingNotifier};
    use crate::storage::MemoryStore;
    use crate::task::{NewTask, Status};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn payload(task_id: &str) -> AlertPayload {
        AlertPayload {
            task_id: task_id.to_string(),
            duration: 25,
            title: "Write report".to_string(),
        }
    }

    #[test]
    fn parse_rejects_default_tap() {
        assert!(NotificationAction::parse("complete", payload("a")).is_ok());
        assert_eq!(
            NotificationAction::parse("default", payload("a")).unwrap_err(),
            ValidationError::UnknownAction("default".into())
        );
    }

    #[test]
    fn complete_marks_task_and_finishes_session_once() {
        let mut state = AppState::default();
        let task = state.add_task(NewTask::new("Write report"), now()).unwrap();
        let session = state.start_session(&task.id, Some(25), now());

        let outcome = complete_task(&mut state, &payload(&task.id), now());
        assert_eq!(
            outcome,
            ActionOutcome::TaskCompleted {
                task_id: task.id.clone(),
                session_id: Some(session.id.clone()),
            }
        );
        assert_eq!(state.task(&task.id).unwrap().status, Status::Completed);
        assert_eq!(state.today_focus_tasks, vec![task.id.clone()]);

        let again = complete_task(&mut state, &payload(&task.id), now());
        assert_eq!(
            again,
            ActionOutcome::TaskCompleted {
                task_id: task.id.clone(),
                session_id: None,
            }
        );
        assert_eq!(state.today_focus_tasks.len(), 1);
    }

    #[test]
    fn complete_for_unknown_task_changes_nothing() {
        let mut state = AppState::default();
        let before = state.clone();
        let outcome = complete_task(&mut state, &payload("ghost"), now());
        assert!(matches!(outcome, ActionOutcome::Ignored { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn reschedule_cancels_then_schedules_in_minutes() {
        let notifier = RecordingNotifier::new();
        let outcome = reschedule(&notifier, &payload("a"), now());
        let fire_at = now() + Duration::minutes(25);
        assert_eq!(outcome, ActionOutcome::Rescheduled { fire_at });

        let calls = notifier.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], NotifierCall::Cancel);
        let pending = notifier.pending().unwrap();
        assert_eq!(pending.fire_at, fire_at);
        assert_eq!(pending.payload.task_id, "a");
    }

    #[test]
    fn reschedule_survives_failing_notifier() {
        let notifier = RecordingNotifier::failing();
        let outcome = reschedule(&notifier, &payload("a"), now());
        assert!(matches!(outcome, ActionOutcome::Rescheduled { .. }));
    }

    #[test]
    fn inbox_waits_for_ready_store_then_applies_in_order() {
        let mut seeded = AppState::default();
        let task = seeded.add_task(NewTask::new("Write report"), now()).unwrap();
        seeded.start_session(&task.id, Some(25), now());

        let store = MemoryStore::not_ready(seeded);
        let notifier = RecordingNotifier::new();
        let mut inbox = ActionInbox::new();

        inbox.deliver(NotificationAction::new(ActionId::Restart, payload(&task.id)));
        inbox.deliver(NotificationAction::new(ActionId::Complete, payload(&task.id)));

        assert!(inbox.drain(&store, &notifier, now()).unwrap().is_empty());
        assert_eq!(inbox.pending(), 2);
        assert!(notifier.calls().is_empty());

        store.set_ready(true);
        let outcomes = inbox.drain(&store, &notifier, now()).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], ActionOutcome::Rescheduled { .. }));
        assert!(matches!(outcomes[1], ActionOutcome::TaskCompleted { .. }));
        assert_eq!(inbox.pending(), 0);

        let saved = store.load().unwrap();
        assert_eq!(saved.task(&task.id).unwrap().status, Status::Completed);
        // Completing last clears the alert the restart scheduled.
        assert!(notifier.pending().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_until_ready_returns_once_ready() {
        let store = std::sync::Arc::new(MemoryStore::not_ready(AppState::default()));
        let flag = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            flag.set_ready(true);
        });
        wait_until_ready(&*store, std::time::Duration::from_millis(100)).await;
        assert!(store.is_ready());
    }
}
