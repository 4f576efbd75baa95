//! Local record store
//!
//! The whole application state lives in one [`Aggregate`] serialized under a
//! single key. Reads never fail; writes stamp `lastUpdated` and publish a
//! change event after the blob is stored.

use crate::error::{Result, StorageError};
use crate::kv::{KeyValueStore, MemoryStore};
use crate::notifier::ChangeNotifier;
use scholar_core::{now_millis, Aggregate, Collection, DEFAULT_STORAGE_KEY};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Key the aggregate is stored under
    pub key: String,
    /// Re-runs allowed when another writer got in first
    pub max_conflict_retries: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            max_conflict_retries: 8,
        }
    }
}

/// Outcome of a mutation passed to [`RecordStore::transact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
    /// Persist the mutated aggregate and return the value.
    Write(T),
    /// Leave storage untouched and return the value.
    Skip(T),
}

pub struct RecordStore {
    backend: Arc<dyn KeyValueStore>,
    notifier: ChangeNotifier,
    options: StoreOptions,
}

impl RecordStore {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        notifier: ChangeNotifier,
        options: StoreOptions,
    ) -> Self {
        Self {
            backend,
            notifier,
            options,
        }
    }

    /// Store over a fresh in-memory backend with a local-only notifier.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            ChangeNotifier::local(),
            StoreOptions::default(),
        )
    }

    pub fn key(&self) -> &str {
        &self.options.key
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Raw blob and its parsed value. Anything unreadable parses as empty.
    fn load(&self) -> (Option<String>, Aggregate) {
        let raw = match self.backend.get(&self.options.key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.options.key, error = %e, "failed to read records; using empty state");
                return (None, Aggregate::default());
            }
        };

        let aggregate = match raw.as_deref() {
            Some(blob) => serde_json::from_str(blob).unwrap_or_else(|e| {
                warn!(key = %self.options.key, error = %e, "malformed records; using empty state");
                Aggregate::default()
            }),
            None => Aggregate::default(),
        };

        (raw, aggregate)
    }

    /// Current aggregate, or an empty one when missing or unreadable.
    pub fn read(&self) -> Aggregate {
        self.load().1
    }

    /// Replace the stored aggregate unconditionally and publish `changed`.
    ///
    /// Last writer wins; use [`RecordStore::transact`] for read-modify-write.
    pub fn write(&self, mut aggregate: Aggregate, changed: &[Collection]) -> Result<()> {
        aggregate.last_updated = now_millis();
        let serialized = serde_json::to_string(&aggregate)?;
        self.backend.set(&self.options.key, &serialized)?;
        self.notifier.publish(changed);
        Ok(())
    }

    /// Read, mutate and conditionally write the aggregate as one unit.
    ///
    /// The write only lands if the stored blob is still the one that was
    /// read; otherwise `mutate` runs again on fresh state. After
    /// `max_conflict_retries` re-runs the call fails with
    /// [`StorageError::Conflict`]. Errors from `mutate` abort without
    /// writing.
    pub fn transact<T, E, F>(&self, changed: &[Collection], mut mutate: F) -> std::result::Result<T, E>
    where
        F: FnMut(&mut Aggregate) -> std::result::Result<Change<T>, E>,
        E: From<StorageError>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let (raw, mut aggregate) = self.load();

            let value = match mutate(&mut aggregate)? {
                Change::Skip(value) => return Ok(value),
                Change::Write(value) => value,
            };

            aggregate.last_updated = now_millis();
            let serialized = serde_json::to_string(&aggregate).map_err(StorageError::from)?;

            if self
                .backend
                .compare_and_swap(&self.options.key, raw.as_deref(), &serialized)?
            {
                self.notifier.publish(changed);
                return Ok(value);
            }

            if attempts > self.options.max_conflict_retries {
                return Err(StorageError::Conflict {
                    key: self.options.key.clone(),
                    attempts,
                }
                .into());
            }
            debug!(key = %self.options.key, attempts, "records changed underneath; retrying");
        }
    }

    /// [`RecordStore::transact`] for mutations that cannot fail themselves.
    pub fn update<T, F>(&self, changed: &[Collection], mut mutate: F) -> Result<T>
    where
        F: FnMut(&mut Aggregate) -> Change<T>,
    {
        self.transact(changed, |aggregate| Ok::<_, StorageError>(mutate(aggregate)))
    }

    /// Drop all stored records.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(&self.options.key)?;
        self.notifier.publish(&Collection::ALL);
        Ok(())
    }

    pub fn export(&self) -> Aggregate {
        self.read()
    }

    /// Replace everything with `aggregate`.
    pub fn import(&self, aggregate: Aggregate) -> Result<()> {
        self.write(aggregate, &Collection::ALL)
    }

    /// Ask every subscriber to re-read everything.
    pub fn force_refresh(&self) {
        self.notifier.publish(&Collection::ALL);
    }
}
