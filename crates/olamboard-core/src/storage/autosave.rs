//! Periodic saving of the board's save code.

use crate::storage::{SaveStore, StorageResult};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// The page saves once a second after autosave is switched on.
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 1000;

/// Writes the board's save code to one storage key.
///
/// Manual saves always go through. Periodic saves only run once auto-save
/// has been switched on, and then at most once per interval while there are
/// unsaved changes.
pub struct AutoSaveManager<S: SaveStore> {
    storage: Arc<S>,
    key: String,
    interval: Duration,
    last_save: Option<Instant>,
    /// The board changed since the last write.
    dirty: bool,
    /// Set by the autosave button; never cleared.
    enabled: bool,
}

impl<S: SaveStore> AutoSaveManager<S> {
    /// Create a manager writing to `key`.
    pub fn new(storage: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            interval: Duration::from_millis(DEFAULT_AUTOSAVE_INTERVAL_MS),
            last_save: None,
            dirty: false,
            enabled: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Turn periodic saving on. It stays on for the rest of the session.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether [`maybe_save`](Self::maybe_save) would write now.
    pub fn should_save(&self) -> bool {
        self.enabled
            && self.dirty
            && self
                .last_save
                .is_none_or(|last| last.elapsed() >= self.interval)
    }

    /// Save if due. `code` is only called when a save happens.
    /// Returns true if a save was performed.
    pub fn maybe_save(&mut self, code: impl FnOnce() -> String) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(&code())?;
        Ok(true)
    }

    /// Write `code` now, whatever the schedule says.
    pub fn save(&mut self, code: &str) -> StorageResult<()> {
        self.storage.set(&self.key, code)?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        log::debug!("saved board to {}", self.key);
        Ok(())
    }

    /// The code stored under this manager's key, if any.
    pub fn load(&self) -> StorageResult<Option<String>> {
        self.storage.get(&self.key)
    }
}

/// File storage in the user's data directory natively, local storage in
/// the browser.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::FileStorage>> {
    Ok(Arc::new(crate::storage::FileStorage::default_location()?))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::LocalStorage>> {
    Ok(Arc::new(crate::storage::LocalStorage::new()))
}

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStorage = crate::storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub type PlatformStorage = crate::storage::LocalStorage;
