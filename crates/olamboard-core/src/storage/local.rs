//! Browser local storage implementation for WebAssembly.

use super::{SaveStore, StorageError, StorageResult};

/// Save codes in `window.localStorage`, under the same keys the page uses.
#[derive(Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> StorageResult<web_sys::Storage> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage error: {e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage not available".to_string()))
    }
}

impl SaveStore for LocalStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Other(format!("Failed to read {key}: {e:?}")))
    }

    fn set(&self, key: &str, code: &str) -> StorageResult<()> {
        self.storage()?
            .set_item(key, code)
            .map_err(|e| StorageError::Other(format!("Failed to write {key}: {e:?}")))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Other(format!("Failed to delete {key}: {e:?}")))
    }
}
