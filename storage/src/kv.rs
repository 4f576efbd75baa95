//! Key-value persistence interface

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// String-keyed blob storage the record store is built on.
///
/// One backend may be shared by several record stores; `compare_and_swap`
/// is what lets them detect each other's writes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Store `new` only if the current value equals `expected`
    /// (`None` meaning absent). Returns whether the swap happened.
    fn compare_and_swap(&self, key: &str, expected: Option<&str>, new: &str) -> Result<bool>;
}

/// In-process backend; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, new: &str) -> Result<bool> {
        let mut entries = self.entries.write();
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), new.to_string());
        Ok(true)
    }
}
