mod clock;
mod engine;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{format_clock, TimerConfig, TimerEngine, TimerSnapshot, TimerState};
pub use session::{
    spawn, FocusSession, Lifecycle, SessionCommand, SessionEvent, SessionHandle, SessionTask,
};
