//! User settings stored with the application state.

use clap::Subcommand;
use distill_core::{DateFormat, SettingsPatch, StateStore};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current settings as JSON
    Show,
    /// Change one or more settings
    Set {
        /// Session length in minutes (1-120)
        #[arg(long)]
        duration: Option<u32>,
        /// Start the timer as soon as a session opens
        #[arg(long)]
        auto_start: Option<bool>,
        /// normal or relative
        #[arg(long)]
        date_format: Option<DateFormat>,
    },
}

pub fn run(action: SettingsAction) -> CmdResult {
    let db = open_store()?;

    match action {
        SettingsAction::Show => {
            print_json(&db.load()?.settings)?;
        }
        SettingsAction::Set {
            duration,
            auto_start,
            date_format,
        } => {
            let patch = SettingsPatch {
                time_duration: duration,
                auto_start_timer: auto_start,
                date_format,
            };
            db.update(|s| s.change_settings(patch))??;
            print_json(&db.load()?.settings)?;
        }
    }
    Ok(())
}
