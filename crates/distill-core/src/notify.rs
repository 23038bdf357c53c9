//! Completion alert contract.
//!
//! The platform notification subsystem sits behind [`Notifier`]. The core
//! only builds the request and interprets the action id relayed back; it
//! never renders anything. Every alert shares one fixed identifier, so
//! scheduling again replaces the pending alert and cancelling is always
//! safe.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, ValidationError};

/// Identifier shared by every completion alert.
pub const ALERT_ID: &str = "timer_complete";
/// Android channel the alert is posted on.
pub const CHANNEL_ID: &str = "timer_channel";
/// iOS category carrying the two response actions.
pub const CATEGORY_ID: &str = "timer-actions";

/// Response buttons on a delivered alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionId {
    Complete,
    Restart,
}

impl ActionId {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionId::Complete => "complete",
            ActionId::Restart => "restart",
        }
    }

    pub fn button_title(self) -> &'static str {
        match self {
            ActionId::Complete => "Yes",
            ActionId::Restart => "No, Restart",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(ActionId::Complete),
            "restart" => Ok(ActionId::Restart),
            other => Err(ValidationError::UnknownAction(other.to_string())),
        }
    }
}

/// Data attached to the alert and handed back with the user's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    /// Empty when the session is not tied to a task.
    #[serde(default)]
    pub task_id: String,
    /// Planned length in minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub title: String,
}

impl AlertPayload {
    pub fn task_id(&self) -> Option<&str> {
        if self.task_id.is_empty() {
            None
        } else {
            Some(&self.task_id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAction {
    pub id: ActionId,
    pub title: String,
}

/// One-shot alert at an absolute instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub id: String,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub payload: AlertPayload,
    pub actions: Vec<AlertAction>,
}

impl AlertRequest {
    pub fn timer_completion(
        fire_at: DateTime<Utc>,
        title: &str,
        duration_min: u32,
        task_id: Option<&str>,
    ) -> Self {
        Self {
            id: ALERT_ID.to_string(),
            fire_at,
            title: "Timer Completed".to_string(),
            body: format!("Did you complete '{title}'?"),
            payload: AlertPayload {
                task_id: task_id.unwrap_or_default().to_string(),
                duration: duration_min,
                title: title.to_string(),
            },
            actions: [ActionId::Complete, ActionId::Restart]
                .into_iter()
                .map(|id| AlertAction {
                    id,
                    title: id.button_title().to_string(),
                })
                .collect(),
        }
    }
}

/// Platform notification subsystem.
///
/// Calls are fire-and-forget from the timer's point of view; callers log
/// failures and carry on.
pub trait Notifier: Send + Sync {
    /// Returns whether alerts may be shown.
    fn request_permission(&self) -> Result<bool, NotifyError>;

    /// Schedule the completion alert, replacing any pending one.
    fn schedule(&self, request: &AlertRequest) -> Result<(), NotifyError>;

    /// Remove the pending or delivered completion alert, if any.
    fn cancel(&self) -> Result<(), NotifyError>;
}

/// Drops every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn request_permission(&self) -> Result<bool, NotifyError> {
        Ok(false)
    }

    fn schedule(&self, _request: &AlertRequest) -> Result<(), NotifyError> {
        Ok(())
    }

    fn cancel(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Writes requests to the log instead of a platform API.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn request_permission(&self) -> Result<bool, NotifyError> {
        Ok(true)
    }

    fn schedule(&self, request: &AlertRequest) -> Result<(), NotifyError> {
        tracing::info!(
            id = %request.id,
            fire_at = %request.fire_at,
            task_id = %request.payload.task_id,
            "{}",
            request.body
        );
        Ok(())
    }

    fn cancel(&self) -> Result<(), NotifyError> {
        tracing::info!(id = ALERT_ID, "alert cancelled");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    RequestPermission,
    Schedule(AlertRequest),
    Cancel,
}

/// In-memory notifier that records every call. Can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifierCall>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call is recorded and then reported as failed.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::default(),
            failing: true,
        }
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.lock().clone()
    }

    /// The alert that would currently fire, if any.
    pub fn pending(&self) -> Option<AlertRequest> {
        let mut pending = None;
        for call in self.lock().iter() {
            match call {
                NotifierCall::Schedule(req) => pending = Some(req.clone()),
                NotifierCall::Cancel => pending = None,
                NotifierCall::RequestPermission => {}
            }
        }
        pending
    }

    fn record(&self, call: NotifierCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NotifierCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for RecordingNotifier {
    fn request_permission(&self) -> Result<bool, NotifyError> {
        self.record(NotifierCall::RequestPermission);
        if self.failing {
            return Err(NotifyError::PermissionDenied);
        }
        Ok(true)
    }

    fn schedule(&self, request: &AlertRequest) -> Result<(), NotifyError> {
        self.record(NotifierCall::Schedule(request.clone()));
        if self.failing {
            return Err(NotifyError::ScheduleFailed("notifier unavailable".into()));
        }
        Ok(())
    }

    fn cancel(&self) -> Result<(), NotifyError> {
        self.record(NotifierCall::Cancel);
        if self.failing {
            return Err(NotifyError::CancelFailed("notifier unavailable".into()));
        }
        Ok(())
    }
}
