use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::StateStore;
use crate::error::StoreError;
use crate::state::AppState;

/// In-memory store. Starts ready unless built with [`MemoryStore::not_ready`],
/// which mimics a store still loading from disk.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<AppState>,
    ready: AtomicBool,
}

impl MemoryStore {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Mutex::new(state),
            ready: AtomicBool::new(true),
        }
    }

    pub fn not_ready(state: AppState) -> Self {
        Self {
            state: Mutex::new(state),
            ready: AtomicBool::new(false),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> AppState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<AppState, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &AppState) -> Result<(), StoreError> {
        if !self.is_ready() {
            return Err(StoreError::NotReady);
        }
        *self.lock() = state.clone();
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::Utc;

    #[test]
    fn update_round_trips_through_the_store() {
        let store = MemoryStore::default();
        let id = store
            .update(|s| s.add_task(NewTask::new("Plan week"), Utc::now()).map(|t| t.id))
            .unwrap()
            .unwrap();
        assert!(store.snapshot().task(&id).is_some());
    }

    #[test]
    fn writes_wait_for_readiness() {
        let store = MemoryStore::not_ready(AppState::default());
        assert!(matches!(store.update(|s| s.clear_all()), Err(StoreError::NotReady)));
        store.set_ready(true);
        assert!(store.update(|s| s.clear_all()).is_ok());
    }
}
