//! # Distill Core Library
//!
//! Business logic for Distill, a to-do list that picks what to work on
//! today and runs a focus timer for it. Everything is available through the
//! standalone `distill` CLI; any GUI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Ranking**: a deterministic score over priority, status and due date
//!   that orders the open tasks and selects the top few for today
//! - **Timer**: a wall-clock-anchored state machine. The caller probes it
//!   periodically and when the host returns to the foreground
//! - **Session driver**: one tokio task per timer that serializes ticks,
//!   lifecycle signals and commands, and talks to the [`Notifier`]
//! - **Storage**: the application state as one JSON document in SQLite and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ranking::rank`]: Ordered open tasks
//! - [`TimerEngine`]: Core timer state machine
//! - [`FocusSession`]: Timer bound to a task and an alert collaborator
//! - [`AppState`]: Tasks, sessions and settings with reducer-style updates
//! - [`Database`]: Persistence of the application state
//! - [`Config`]: Application configuration management

pub mod actions;
pub mod error;
pub mod events;
pub mod notify;
pub mod query;
pub mod ranking;
pub mod state;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use actions::{ActionInbox, ActionOutcome, NotificationAction};
pub use error::{ConfigError, CoreError, NotifyError, StoreError, ValidationError};
pub use events::TimerEvent;
pub use notify::{
    ActionId, AlertPayload, AlertRequest, LogNotifier, NoopNotifier, Notifier, RecordingNotifier,
};
pub use query::{SortConfig, SortField, SortOrder, TaskFilter};
pub use ranking::{DueBucket, ScoreBreakdown};
pub use state::{AppState, DateFormat, Settings, SettingsPatch};
pub use storage::{Config, Database, MemoryStore, StateStore};
pub use task::{NewTask, Priority, Session, Status, Task, TaskPatch};
pub use timer::{
    Clock, FocusSession, ManualClock, SessionEvent, SessionTask, SystemClock, TimerConfig,
    TimerEngine, TimerSnapshot, TimerState,
};
