//src/cache.rs
//! Key-value store used to survive process restarts while a draft is open.
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::ActiveWorkoutDraft;

/// Key under which the one active draft is stored.
pub const SESSION_KEY: &str = "active-workout-draft";
const APP_CACHE_DIR: &str = "liftlog";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Could not determine cache directory.")]
    CannotDetermineCacheDir,
    #[error("I/O error accessing draft cache: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize draft snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Cached draft snapshot under '{key}' is unreadable: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The get/set/delete surface the draft session needs.
pub trait DraftCache {
    /// # Errors
    /// Returns `CacheError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    /// # Errors
    /// Returns `CacheError` if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;
    /// Deleting a missing key is not an error.
    /// # Errors
    /// Returns `CacheError` if the backing store cannot be written.
    fn delete(&mut self, key: &str) -> Result<(), CacheError>;
}

/// # Errors
/// Returns `CacheError::Serialize` if the draft cannot be encoded.
pub fn encode_snapshot(draft: &ActiveWorkoutDraft) -> Result<String, CacheError> {
    serde_json::to_string(draft).map_err(CacheError::Serialize)
}

/// # Errors
/// Returns `CacheError::Corrupt` if the stored text is not a draft.
pub fn decode_snapshot(key: &str, raw: &str) -> Result<ActiveWorkoutDraft, CacheError> {
    serde_json::from_str(raw).map_err(|source| CacheError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// In-process cache. Nothing survives a restart; used by tests and embedders.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl DraftCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Uses `dir`, creating it if needed.
    /// # Errors
    /// Returns `CacheError::Io` if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    /// Opens the cache in the platform cache directory.
    /// # Errors
    /// Returns `CacheError` if the directory cannot be determined or created.
    pub fn open_default() -> Result<Self, CacheError> {
        let base = dirs::cache_dir().ok_or(CacheError::CannotDetermineCacheDir)?;
        Self::new(base.join(APP_CACHE_DIR))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DraftCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        // Write then rename so a crash mid-write never leaves half a snapshot.
        let target = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
