//! In-memory storage implementation.

use super::{SaveStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    codes: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.codes.read().map(|codes| codes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl SaveStore for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let codes = self.codes.read().map_err(lock_error)?;
        Ok(codes.get(key).cloned())
    }

    fn set(&self, key: &str, code: &str) -> StorageResult<()> {
        let mut codes = self.codes.write().map_err(lock_error)?;
        codes.insert(key.to_string(), code.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut codes = self.codes.write().map_err(lock_error)?;
        codes.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let storage = MemoryStorage::new();
        storage.set("[olamreee] savecode./olam", "abc").unwrap();
        assert_eq!(storage.get("[olamreee] savecode./olam").unwrap().as_deref(), Some("abc"));

        storage.set("[olamreee] savecode./olam", "def").unwrap();
        assert_eq!(storage.get("[olamreee] savecode./olam").unwrap().as_deref(), Some("def"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert!(storage.is_empty());
    }
}
