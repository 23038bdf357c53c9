//! Persistence for the application state and the config file.

mod config;
pub mod database;
mod memory;

pub use config::{Config, NotificationsConfig, TimerSection, TodayConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::{ConfigError, StoreError};
use crate::state::AppState;

/// Durable home of the [`AppState`] document.
///
/// Writes before [`StateStore::is_ready`] reports true are rejected with
/// [`StoreError::NotReady`].
pub trait StateStore {
    fn load(&self) -> Result<AppState, StoreError>;

    fn save(&self, state: &AppState) -> Result<(), StoreError>;

    fn is_ready(&self) -> bool {
        true
    }

    /// Load, mutate and save in one step.
    fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut AppState) -> T,
        Self: Sized,
    {
        if !self.is_ready() {
            return Err(StoreError::NotReady);
        }
        let mut state = self.load()?;
        let out = f(&mut state);
        self.save(&state)?;
        Ok(out)
    }
}

/// Returns `~/.config/distill[-dev]/`.
///
/// `DISTILL_DATA_DIR` overrides the location entirely; otherwise
/// `DISTILL_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("DISTILL_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DISTILL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("distill-dev")
            } else {
                base_dir.join("distill")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(ConfigError::DataDir)?;
    Ok(dir)
}
