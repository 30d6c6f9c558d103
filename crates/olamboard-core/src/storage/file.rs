//! File-based storage implementation for native platforms.

use super::{SaveStore, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-based storage for native platforms.
///
/// Stores each save code as a text file in a specified directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for save codes.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {e}"))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/olamboard/savecodes/`
    /// On Windows: `%LOCALAPPDATA%\olamboard\savecodes\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Unavailable("Could not determine home directory".to_string()))?;
        Self::new(base.join("olamboard").join("savecodes"))
    }

    /// File path for a key. Keys contain brackets, spaces and slashes.
    fn code_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_key}.txt"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl SaveStore for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.code_path(key);
        match fs::read_to_string(&path) {
            Ok(code) => Ok(Some(code)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!("Failed to read {}: {e}", path.display()))),
        }
    }

    fn set(&self, key: &str, code: &str) -> StorageResult<()> {
        let path = self.code_path(key);
        fs::write(&path, code)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.code_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!("Failed to delete {}: {e}", path.display()))),
        }
    }
}
