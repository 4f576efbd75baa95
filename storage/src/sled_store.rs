//! Sled-based key-value backend
use crate::error::Result;
use crate::kv::KeyValueStore;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
    path: String,
}

impl SledStore {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = sled::open(&path)?;

        Ok(SledStore { db, path: path_str })
    }

    /// Get the database path
    pub fn path(&self) -> &str {
        &self.path
    }

    fn decode(bytes: sled::IVec) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()).into()
        })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        // Flush so the blob survives a restart
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, new: &str) -> Result<bool> {
        let swapped = self
            .db
            .compare_and_swap(
                key.as_bytes(),
                expected.map(str::as_bytes),
                Some(new.as_bytes()),
            )?
            .is_ok();
        if swapped {
            self.db.flush()?;
        }
        Ok(swapped)
    }
}
