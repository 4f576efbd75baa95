//! ICP Scholar Storage Layer
//!
//! Layers, leaves first:
//! - [`KeyValueStore`] backends (memory, one file per key, sled)
//! - [`RecordStore`]: the whole application aggregate under one key
//! - [`ChangeNotifier`]: invalidation events within and across contexts
//! - [`Records`]: narrow per-collection accessors

pub mod error;
pub mod file_store;
pub mod kv;
pub mod notifier;
pub mod record_store;
pub mod records;
pub mod sled_store;

pub use error::{Result, StorageError};
pub use file_store::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use notifier::{ChangeBus, ChangeEvent, ChangeNotifier, Subscription, BUS_CAPACITY};
pub use record_store::{Change, RecordStore, StoreOptions};
pub use records::Records;
pub use sled_store::SledStore;
