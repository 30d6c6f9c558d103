//! Storage abstraction for save codes.
//!
//! A board persists a single save-code string per storage key. Browsers
//! expose this synchronously through local storage, so the trait is
//! synchronous too.

mod autosave;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use autosave::{
    AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_MS, PlatformStorage, create_default_storage,
};
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Other(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value store for save codes. Shared across threads natively.
#[cfg(not(target_arch = "wasm32"))]
pub trait SaveStore: Send + Sync {
    /// Read the code stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a code under `key`, replacing any previous one.
    fn set(&self, key: &str, code: &str) -> StorageResult<()>;

    /// Forget `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Key/value store for save codes.
#[cfg(target_arch = "wasm32")]
pub trait SaveStore {
    /// Read the code stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a code under `key`, replacing any previous one.
    fn set(&self, key: &str, code: &str) -> StorageResult<()>;

    /// Forget `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
