//! File-based key-value backend
//!
//! Each key is one `<key>.json` file in the data directory. Writes go to a
//! temporary file first and are renamed into place, so a reader never sees a
//! half-written blob.

use crate::error::{Result, StorageError};
use crate::kv::KeyValueStore;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FileStore {
    data_dir: PathBuf,
    /// Serializes compare-and-swap within this process.
    swap_lock: Mutex<()>,
}

impl FileStore {
    /// Open storage directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self {
            data_dir,
            swap_lock: Mutex::new(()),
        })
    }

    /// Get storage directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }

    fn read_path(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_path(path: &Path, value: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Self::read_path(&self.path_for(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self.swap_lock.lock();
        Self::write_path(&path, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self.swap_lock.lock();
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, new: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        let _guard = self.swap_lock.lock();
        let current = Self::read_path(&path)?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        Self::write_path(&path, new)?;
        Ok(true)
    }
}
