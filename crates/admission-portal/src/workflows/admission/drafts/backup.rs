use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::ApplicationDocument;

/// Default slot name for the single outstanding backup.
pub const LOCAL_BACKUP_KEY: &str = "admissionFormBackup";

/// Device-local mirror of the document, written when remote persistence is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBackup {
    pub data: ApplicationDocument,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("backup storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("backup content is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("backup storage is unavailable")]
    Unavailable,
}

/// Synchronous key-addressed storage holding at most one backup per key.
pub trait BackupStore: Send + Sync {
    fn write(&self, key: &str, backup: &LocalBackup) -> Result<(), BackupError>;
    fn read(&self, key: &str) -> Result<Option<LocalBackup>, BackupError>;
    fn clear(&self, key: &str) -> Result<(), BackupError>;
}

/// Stores each key as `<dir>/<key>.json`, replacing the file atomically on write.
#[derive(Debug, Clone)]
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl BackupStore for FileBackupStore {
    fn write(&self, key: &str, backup: &LocalBackup) -> Result<(), BackupError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec(backup)?)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<LocalBackup>, BackupError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn clear(&self, key: &str) -> Result<(), BackupError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store holding serialized backups; can be switched off to model disabled storage.
#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    slots: Mutex<HashMap<String, String>>,
    disabled: bool,
}

impl MemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, like storage blocked by the platform.
    pub fn disabled() -> Self {
        Self {
            slots: Mutex::default(),
            disabled: true,
        }
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, BackupError> {
        if self.disabled {
            return Err(BackupError::Unavailable);
        }
        self.slots.lock().map_err(|_| BackupError::Unavailable)
    }
}

impl BackupStore for MemoryBackupStore {
    fn write(&self, key: &str, backup: &LocalBackup) -> Result<(), BackupError> {
        let encoded = serde_json::to_string(backup)?;
        self.slots()?.insert(key.to_string(), encoded);
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<LocalBackup>, BackupError> {
        match self.slots()?.get(key) {
            Some(encoded) => Ok(Some(serde_json::from_str(encoded)?)),
            None => Ok(None),
        }
    }

    fn clear(&self, key: &str) -> Result<(), BackupError> {
        self.slots()?.remove(key);
        Ok(())
    }
}
