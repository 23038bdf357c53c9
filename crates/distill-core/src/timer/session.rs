//! One focus timer bound to one task, plus its async driver.
//!
//! [`FocusSession`] owns the [`TimerEngine`] and turns its events into
//! notifier calls. [`spawn`] runs a session on a single tokio task that
//! serializes ticks, host lifecycle signals and commands, so the engine
//! never sees two callers at once.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::clock::Clock;
use super::engine::{TimerConfig, TimerEngine, TimerSnapshot, TimerState};
use crate::actions::NotificationAction;
use crate::events::TimerEvent;
use crate::notify::{ActionId, AlertPayload, AlertRequest, Notifier};

const CHANNEL_CAPACITY: usize = 64;

/// The task a session is working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTask {
    pub task_id: Option<String>,
    pub title: String,
    pub duration_min: u32,
}

impl SessionTask {
    pub fn new(task_id: Option<String>, title: impl Into<String>, duration_min: u32) -> Self {
        Self {
            task_id,
            title: title.into(),
            duration_min,
        }
    }

    fn alert(&self, fire_at: DateTime<Utc>) -> AlertRequest {
        AlertRequest::timer_completion(
            fire_at,
            &self.title,
            self.duration_min,
            self.task_id.as_deref(),
        )
    }
}

/// What the owner of a session has to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A timer transition that needs no bookkeeping beyond the alert.
    Timer(TimerEvent),
    /// First start of the timer. The caller records a new session.
    SessionStarted {
        task_id: Option<String>,
        duration_min: u32,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero.
    Finished { at: DateTime<Utc> },
    /// The user confirmed the task from the alert.
    TaskCompleted(AlertPayload),
    /// Periodic progress while the timer runs.
    Tick(TimerSnapshot),
    /// The driver stopped.
    Closed,
}

pub struct FocusSession {
    engine: TimerEngine,
    task: SessionTask,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    notifications_enabled: bool,
}

impl FocusSession {
    pub fn new(
        task: SessionTask,
        auto_start: bool,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = TimerConfig::minutes(task.duration_min).auto_start(auto_start);
        Self {
            engine: TimerEngine::new(config),
            task,
            notifier,
            clock,
            notifications_enabled: true,
        }
    }

    /// Turn alert scheduling on or off. The timer behaves the same either way.
    pub fn notifications(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    pub fn task(&self) -> &SessionTask {
        &self.task
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot(self.clock.now())
    }

    /// Screen opened: ask for alert permission and honour auto-start.
    pub fn open(&mut self) -> Vec<SessionEvent> {
        if self.notifications_enabled {
            match self.notifier.request_permission() {
                Ok(true) => {}
                Ok(false) => tracing::info!("alert permission not granted"),
                Err(e) => tracing::warn!(error = %e, "alert permission request failed"),
            }
        }
        if self.engine.config().auto_start {
            self.start()
        } else {
            Vec::new()
        }
    }

    pub fn start(&mut self) -> Vec<SessionEvent> {
        let events = self.engine.start(self.clock.now());
        self.dispatch(events)
    }

    pub fn pause(&mut self) -> Vec<SessionEvent> {
        let events = self.engine.pause(self.clock.now());
        self.dispatch(events)
    }

    pub fn reset(&mut self) -> Vec<SessionEvent> {
        let events = self.engine.reset(self.clock.now());
        self.dispatch(events)
    }

    pub fn restart(&mut self) -> Vec<SessionEvent> {
        let events = self.engine.restart(self.clock.now());
        self.dispatch(events)
    }

    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let events = self.engine.tick(self.clock.now());
        self.dispatch(events)
    }

    pub fn resume_foreground(&mut self) -> Vec<SessionEvent> {
        let events = self.engine.resume_foreground(self.clock.now());
        self.dispatch(events)
    }

    /// Answer relayed from the completion alert while this session is live.
    ///
    /// "complete" never touches the timer, so confirming after the
    /// countdown ended cannot record a second session.
    pub fn handle_action(&mut self, action: &NotificationAction) -> Vec<SessionEvent> {
        match action.action_id {
            ActionId::Complete => {
                self.cancel_alert();
                vec![SessionEvent::TaskCompleted(action.payload.clone())]
            }
            ActionId::Restart => self.restart(),
        }
    }

    fn dispatch(&self, events: Vec<TimerEvent>) -> Vec<SessionEvent> {
        events
            .into_iter()
            .map(|event| {
                if let Some(deadline) = event.schedules_alert_at() {
                    self.schedule_alert(deadline);
                } else if event.cancels_alert() {
                    self.cancel_alert();
                }
                match event {
                    TimerEvent::FirstStart { at } => SessionEvent::SessionStarted {
                        task_id: self.task.task_id.clone(),
                        duration_min: self.task.duration_min,
                        at,
                    },
                    TimerEvent::Finished { at } => SessionEvent::Finished { at },
                    other => SessionEvent::Timer(other),
                }
            })
            .collect()
    }

    fn schedule_alert(&self, deadline: DateTime<Utc>) {
        if !self.notifications_enabled {
            return;
        }
        if let Err(e) = self.notifier.schedule(&self.task.alert(deadline)) {
            tracing::warn!(error = %e, %deadline, "failed to schedule completion alert");
        }
    }

    fn cancel_alert(&self) {
        if !self.notifications_enabled {
            return;
        }
        if let Err(e) = self.notifier.cancel() {
            tracing::warn!(error = %e, "failed to cancel completion alert");
        }
    }
}

/// Host process visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Foreground,
    Background,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Pause,
    Reset,
    Restart,
    Lifecycle(Lifecycle),
    Action(NotificationAction),
    Close,
}

/// Owner side of a running driver. Dropping it stops the driver.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Returns false once the driver has stopped.
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub fn sender(&self) -> mpsc::Sender<SessionCommand> {
        self.commands.clone()
    }

    /// Ask the driver to stop and wait for it.
    pub async fn close(mut self) {
        let _ = self.commands.send(SessionCommand::Close).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "session driver ended abnormally");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Run `session` on its own task, probing the timer every `period`.
pub fn spawn(
    session: FocusSession,
    period: Duration,
) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
    let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (update_tx, update_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(session.run(period, command_rx, update_tx));
    let handle = SessionHandle {
        commands: command_tx,
        task: Some(task),
    };
    (handle, update_rx)
}

impl FocusSession {
    /// Drive the session until `Close`, until every command sender is
    /// gone, or until nobody listens for updates.
    pub async fn run(
        mut self,
        period: Duration,
        mut commands: mpsc::Receiver<SessionCommand>,
        updates: mpsc::Sender<SessionEvent>,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut foreground = true;

        let opened = self.open();
        if !forward(&updates, opened).await {
            return;
        }

        loop {
            let events = tokio::select! {
                _ = ticker.tick() => {
                    // Suspended hosts get no probe; the foreground signal
                    // catches up instead.
                    if !foreground {
                        continue;
                    }
                    let was_running = self.engine.state() == TimerState::Running;
                    let mut events = self.tick();
                    if was_running {
                        events.push(SessionEvent::Tick(self.snapshot()));
                    }
                    events
                }
                command = commands.recv() => match command {
                    None | Some(SessionCommand::Close) => break,
                    Some(SessionCommand::Lifecycle(Lifecycle::Background)) => {
                        tracing::debug!("host went to background");
                        foreground = false;
                        Vec::new()
                    }
                    Some(SessionCommand::Lifecycle(Lifecycle::Foreground)) => {
                        tracing::debug!("host back in foreground");
                        foreground = true;
                        self.resume_foreground()
                    }
                    Some(SessionCommand::Start) => self.start(),
                    Some(SessionCommand::Pause) => self.pause(),
                    Some(SessionCommand::Reset) => self.reset(),
                    Some(SessionCommand::Restart) => self.restart(),
                    Some(SessionCommand::Action(action)) => self.handle_action(&action),
                },
            };
            if !forward(&updates, events).await {
                tracing::debug!("update receiver gone, stopping session");
                return;
            }
        }

        let _ = updates.send(SessionEvent::Closed).await;
    }
}

async fn forward(updates: &mpsc::Sender<SessionEvent>, events: Vec<SessionEvent>) -> bool {
    for event in events {
        if updates.send(event).await.is_err() {
            return false;
        }
    }
    true
}
