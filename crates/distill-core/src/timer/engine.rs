//! Focus timer state machine.
//!
//! The timer is anchored to an absolute wall-clock deadline. Remaining time
//! is always `deadline - now`, never a decremented counter, so time spent
//! while the host process was suspended shows up the moment it runs again.
//! The engine owns no thread: the caller invokes [`TimerEngine::recompute`]
//! periodically and whenever the host returns to the foreground.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Completed
//!   ^        |                                  |
//!   +-reset--+-------------- restart -----------+--> Running
//! ```
//!
//! Every command takes the current instant explicitly and returns the
//! [`TimerEvent`]s it produced.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::TimerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Full length of one run, in seconds.
    pub initial_secs: u64,
    /// Start immediately on open and after every reset.
    pub auto_start: bool,
}

impl TimerConfig {
    pub fn minutes(minutes: u32) -> Self {
        Self {
            initial_secs: u64::from(minutes) * 60,
            auto_start: false,
        }
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}

/// Read-only view of the timer at an instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_secs: u64,
    pub total_secs: u64,
    pub has_started: bool,
    pub has_completed: bool,
    pub deadline: Option<DateTime<Utc>>,
    /// 0.0 .. 1.0, zero until the timer has been started.
    pub progress: f64,
    /// `mm:ss`
    pub display: String,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: TimerConfig,
    state: TimerState,
    remaining_secs: u64,
    has_been_started: bool,
    deadline: Option<DateTime<Utc>>,
}

impl TimerEngine {
    /// Create an idle timer. Auto-start is applied by the owner calling
    /// [`TimerEngine::start`] once it is ready to observe events.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            state: TimerState::Idle,
            remaining_secs: config.initial_secs,
            has_been_started: false,
            deadline: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn has_been_started(&self) -> bool {
        self.has_been_started
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Remaining seconds as of the last recomputation.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Remaining seconds at `now`, without mutating the timer.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        match (self.state, self.deadline) {
            (TimerState::Running, Some(deadline)) => secs_until(deadline, now),
            _ => self.remaining_secs,
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        let remaining = self.remaining_at(now);
        let total = self.config.initial_secs;
        let progress = if self.has_been_started && total > 0 {
            (1.0 - remaining as f64 / total as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        TimerSnapshot {
            state: self.state,
            remaining_secs: remaining,
            total_secs: total,
            has_started: self.has_been_started,
            has_completed: self.state == TimerState::Completed,
            deadline: self.deadline,
            progress,
            display: format_clock(remaining),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle/Paused -> Running. No-op while Running or Completed.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                let mut events = Vec::with_capacity(3);
                if !self.has_been_started {
                    self.has_been_started = true;
                    events.push(TimerEvent::FirstStart { at: now });
                }
                let deadline = self.arm(now, self.remaining_secs);
                events.push(TimerEvent::Started {
                    deadline,
                    remaining_secs: self.remaining_secs,
                    at: now,
                });
                // A zero-length run finishes on the spot.
                events.extend(self.recompute(now));
                events
            }
            TimerState::Running | TimerState::Completed => Vec::new(),
        }
    }

    /// Running -> Paused, freezing the remaining time.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        if self.state != TimerState::Running {
            return Vec::new();
        }
        let finished = self.recompute(now);
        if !finished.is_empty() {
            return finished;
        }
        self.state = TimerState::Paused;
        self.deadline = None;
        tracing::debug!(remaining_secs = self.remaining_secs, "timer paused");
        vec![TimerEvent::Paused {
            remaining_secs: self.remaining_secs,
            at: now,
        }]
    }

    /// Back to a full-length Idle timer. With auto-start the timer goes
    /// straight back to Running from `now`.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        self.state = TimerState::Idle;
        self.deadline = None;
        self.remaining_secs = self.config.initial_secs;
        self.has_been_started = self.config.auto_start;

        let mut events = vec![TimerEvent::Reset { at: now }];
        if self.config.auto_start {
            let deadline = self.arm(now, self.config.initial_secs);
            events.push(TimerEvent::Started {
                deadline,
                remaining_secs: self.remaining_secs,
                at: now,
            });
            events.extend(self.recompute(now));
        }
        tracing::debug!(auto_start = self.config.auto_start, "timer reset");
        events
    }

    /// Unconditionally run again for the full length from `now`.
    pub fn restart(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let mut events = Vec::with_capacity(3);
        if !self.has_been_started {
            self.has_been_started = true;
            events.push(TimerEvent::FirstStart { at: now });
        }
        self.remaining_secs = self.config.initial_secs;
        let deadline = self.arm(now, self.config.initial_secs);
        events.push(TimerEvent::Restarted { deadline, at: now });
        events.extend(self.recompute(now));
        tracing::debug!(%deadline, "timer restarted");
        events
    }

    /// Recompute remaining time from the deadline.
    ///
    /// Idempotent: safe to call from the periodic tick and from the
    /// foreground-resume hook in any order. Emits `Finished` exactly once,
    /// on the call that observes the deadline passing.
    pub fn recompute(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let (TimerState::Running, Some(deadline)) = (self.state, self.deadline) else {
            return Vec::new();
        };
        self.remaining_secs = secs_until(deadline, now);
        if self.remaining_secs > 0 {
            return Vec::new();
        }
        self.state = TimerState::Completed;
        self.deadline = None;
        tracing::debug!("timer finished");
        vec![TimerEvent::Finished { at: now }]
    }

    /// Periodic probe.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        self.recompute(now)
    }

    /// Host came back to the foreground; correct any drift immediately.
    pub fn resume_foreground(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        self.recompute(now)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm(&mut self, now: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
        // Lengths past chrono's range run until the end of representable time.
        let deadline = i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|length| now.checked_add_signed(length))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.deadline = Some(deadline);
        self.state = TimerState::Running;
        deadline
    }
}

/// `max(0, ceil((deadline - now) / 1s))`
fn secs_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let ms = (deadline - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        (ms as u64).div_ceil(1000)
    }
}

/// Format seconds as a zero-padded `mm:ss` countdown.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
