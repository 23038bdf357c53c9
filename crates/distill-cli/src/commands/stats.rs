use distill_core::{stats, StateStore};

use super::{open_store, print_json, today, CmdResult};

pub fn run() -> CmdResult {
    let db = open_store()?;
    let state = db.load()?;
    let overview = stats::overview(&state.tasks, &state.sessions, today());
    print_json(&overview)
}
