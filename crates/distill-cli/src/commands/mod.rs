pub mod config;
pub mod notify;
pub mod session;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;

use chrono::{Local, NaiveDate};
use distill_core::{Database, StateStore};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// The local calendar day every command evaluates against.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Open the database and roll the state to today. The document is only
/// written back when the day actually changed.
pub fn open_store() -> Result<Database, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let day = today();
    let mut state = db.load()?;
    if state.set_date(day) {
        db.save(&state)?;
        tracing::debug!(%day, "rolled state to a new day");
    }
    Ok(db)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
